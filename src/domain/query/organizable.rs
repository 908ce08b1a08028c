//! Capability trait for resources exposed through list endpoints.

/// Value type of a property, used to parse raw filter values before they reach SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Text,
    Integer,
    Boolean,
    Timestamp,
}

/// A resource whose list endpoint accepts `filter`, `search` and `sort` parameters.
///
/// The three allow-lists are the only property names the organizer will ever
/// emit. They double as SQL column names, so they must be plain identifiers.
///
/// # Example
///
/// ```rust,ignore
/// impl Organizable for Recipe {
///     fn sortable_properties() -> &'static [&'static str] {
///         &["name", "created_at"]
///     }
///     fn filterable_properties() -> &'static [&'static str] {
///         &["name", "cookbook_id"]
///     }
///     fn searchable_properties() -> &'static [&'static str] {
///         &["name", "description"]
///     }
/// }
/// ```
pub trait Organizable {
    fn sortable_properties() -> &'static [&'static str];

    fn filterable_properties() -> &'static [&'static str];

    fn searchable_properties() -> &'static [&'static str];

    /// Type of a filterable property. Defaults to text.
    fn property_type(_property: &str) -> PropertyType {
        PropertyType::Text
    }
}

/// Looks up `name` in an allow-list, returning the list's own `'static` entry.
pub(crate) fn allowed(list: &'static [&'static str], name: &str) -> Option<&'static str> {
    list.iter().find(|p| **p == name).copied()
}
