//! Request-driven query organization for list endpoints.
//!
//! - [`organizable`] - The per-resource allow-list contract
//! - [`organizer`] - Parsing of `filter`, `search` and `sort` parameters
//! - [`page`] - Pagination window and result page
//!
//! The parsed [`OrganizedQuery`] is applied to SQL by
//! `crate::infrastructure::persistence::query_builder`.

pub mod organizable;
pub mod organizer;
pub mod page;

pub use organizable::{Organizable, PropertyType};
pub use organizer::{
    FilterClause, FilterLiteral, FilterOperator, FilterValue, NULL_MARKER, OrganizedQuery, Search,
    SortClause, SortDirection, organize,
};
pub use page::{Page, PageRequest};
