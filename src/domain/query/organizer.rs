//! Parsing of `filter`, `search` and `sort` query parameters.
//!
//! # Grammar
//!
//! ```text
//! sort=-created_at,name              descending created_at, then ascending name
//! filter[prop]=value                 prop = value
//! filter[prop][op]=value             op in not, like, in, notin, lt, le, ge, gt
//! filter[prop][in]=a,b,c             comma separated list for in / notin
//! filter[prop]=%00                   prop IS NULL
//! filter[prop][not]=%00              prop IS NOT NULL
//! search=term                        any searchable property contains term
//! ```
//!
//! Anything outside the resource's allow-lists, and anything malformed, is
//! dropped silently so stale client links keep working.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::organizable::{Organizable, PropertyType, allowed};

/// Raw value clients send to mean SQL `NULL`.
pub const NULL_MARKER: &str = "\0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Not,
    Like,
    In,
    NotIn,
    Lt,
    Le,
    Ge,
    Gt,
}

impl FilterOperator {
    fn from_param(s: &str) -> Option<Self> {
        Some(match s {
            "not" => FilterOperator::Not,
            "like" => FilterOperator::Like,
            "in" => FilterOperator::In,
            "notin" => FilterOperator::NotIn,
            "lt" => FilterOperator::Lt,
            "le" => FilterOperator::Le,
            "ge" => FilterOperator::Ge,
            "gt" => FilterOperator::Gt,
            _ => return None,
        })
    }
}

/// A filter operand already parsed into the property's type.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterLiteral {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl FilterLiteral {
    fn parse(raw: &str, ty: PropertyType) -> Option<Self> {
        match ty {
            PropertyType::Text => Some(FilterLiteral::Text(raw.to_string())),
            PropertyType::Integer => raw.trim().parse().ok().map(FilterLiteral::Integer),
            PropertyType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => Some(FilterLiteral::Boolean(true)),
                "0" | "false" => Some(FilterLiteral::Boolean(false)),
                _ => None,
            },
            PropertyType::Timestamp => parse_timestamp(raw.trim()).map(FilterLiteral::Timestamp),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Single(FilterLiteral),
    List(Vec<FilterLiteral>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub property: &'static str,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub property: &'static str,
    pub direction: SortDirection,
}

/// "Contains" search across several properties, OR-combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
    pub term: String,
    pub properties: &'static [&'static str],
}

/// The parsed, allow-listed query augmentation for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizedQuery {
    pub filters: Vec<FilterClause>,
    pub search: Option<Search>,
    pub sort: Vec<SortClause>,
}

/// Turns raw query pairs into an [`OrganizedQuery`] for resource `T`.
///
/// Pairs are expected percent-decoded, in request order. When the same
/// `filter[prop][op]` key repeats, the last value wins.
pub fn organize<T: Organizable>(params: &[(String, String)]) -> OrganizedQuery {
    let mut query = OrganizedQuery::default();

    for (key, value) in params {
        if key == "sort" {
            query.sort = parse_sort::<T>(value);
        } else if key == "search" {
            query.search = parse_search::<T>(value);
        } else if let Some(rest) = key.strip_prefix("filter") {
            let Some(clause) = parse_filter::<T>(rest, value) else {
                continue;
            };
            query
                .filters
                .retain(|c| !(c.property == clause.property && c.operator == clause.operator));
            query.filters.push(clause);
        }
    }

    query
}

fn parse_sort<T: Organizable>(raw: &str) -> Vec<SortClause> {
    let mut clauses: Vec<SortClause> = Vec::new();

    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, direction) = match part.strip_prefix('-') {
            Some(name) => (name, SortDirection::Desc),
            None => (part, SortDirection::Asc),
        };

        let Some(property) = allowed(T::sortable_properties(), name) else {
            continue;
        };

        if clauses.iter().any(|c| c.property == property) {
            continue;
        }

        clauses.push(SortClause {
            property,
            direction,
        });
    }

    clauses
}

fn parse_search<T: Organizable>(raw: &str) -> Option<Search> {
    let term = raw.trim();
    let properties = T::searchable_properties();

    if term.is_empty() || properties.is_empty() {
        return None;
    }

    Some(Search {
        term: term.to_string(),
        properties,
    })
}

/// Splits `[a][b]` into `["a", "b"]`. Returns `None` for anything else.
fn bracket_segments(rest: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let mut remaining = rest;

    while !remaining.is_empty() {
        let inner = remaining.strip_prefix('[')?;
        let end = inner.find(']')?;
        let segment = &inner[..end];
        if segment.is_empty() || segment.contains('[') {
            return None;
        }
        segments.push(segment);
        remaining = &inner[end + 1..];
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

fn parse_filter<T: Organizable>(rest: &str, raw: &str) -> Option<FilterClause> {
    let segments = bracket_segments(rest)?;

    let (name, operator) = match segments.as_slice() {
        [name] => (*name, FilterOperator::Eq),
        [name, op] => (*name, FilterOperator::from_param(op)?),
        _ => return None,
    };

    let property = allowed(T::filterable_properties(), name)?;
    let ty = T::property_type(property);

    let value = if raw == NULL_MARKER {
        match operator {
            FilterOperator::Eq | FilterOperator::Not => FilterValue::Null,
            _ => return None,
        }
    } else {
        match operator {
            FilterOperator::In | FilterOperator::NotIn => {
                let items = raw
                    .split(',')
                    .map(|item| FilterLiteral::parse(item, ty))
                    .collect::<Option<Vec<_>>>()?;
                if items.is_empty() || raw.is_empty() {
                    return None;
                }
                FilterValue::List(items)
            }
            FilterOperator::Like => {
                if ty != PropertyType::Text {
                    return None;
                }
                FilterValue::Single(FilterLiteral::Text(raw.to_string()))
            }
            _ => FilterValue::Single(FilterLiteral::parse(raw, ty)?),
        }
    };

    Some(FilterClause {
        property,
        operator,
        value,
    })
}
