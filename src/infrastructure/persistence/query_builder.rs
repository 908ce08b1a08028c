//! Renders an [`OrganizedQuery`] into SQL on a [`QueryBuilder`].
//!
//! Property names come from the resources' allow-lists (`&'static str`) and
//! match column names, so they are pushed verbatim; every value is bound.
//!
//! Search uses `ILIKE`, which makes it case-insensitive on PostgreSQL
//! regardless of collation. `filter[prop][like]` passes the client pattern
//! through unchanged, so `%` and `_` act as wildcards there.

use sqlx::{Postgres, QueryBuilder};

use crate::domain::query::{
    FilterClause, FilterLiteral, FilterOperator, FilterValue, OrganizedQuery, SortDirection,
};

/// Appends ` AND ...` for every filter and the search, if any.
///
/// The builder must already end inside a `WHERE` clause.
pub fn push_conditions(builder: &mut QueryBuilder<'_, Postgres>, query: &OrganizedQuery) {
    for clause in &query.filters {
        builder.push(" AND ");
        push_filter(builder, clause);
    }

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", escape_like(&search.term));

        builder.push(" AND (");
        for (i, property) in search.properties.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push(*property);
            builder.push(" ILIKE ");
            builder.push_bind(pattern.clone());
        }
        builder.push(")");
    }
}

/// Appends `ORDER BY`, always ending with `id` so pages are stable.
///
/// Without sort clauses the newest rows (highest id) come first.
pub fn push_order_by(builder: &mut QueryBuilder<'_, Postgres>, query: &OrganizedQuery) {
    builder.push(" ORDER BY ");

    if query.sort.is_empty() {
        builder.push("id DESC");
        return;
    }

    for clause in &query.sort {
        builder.push(clause.property);
        builder.push(match clause.direction {
            SortDirection::Asc => " ASC, ",
            SortDirection::Desc => " DESC, ",
        });
    }
    builder.push("id ASC");
}

pub fn push_limit_offset(builder: &mut QueryBuilder<'_, Postgres>, limit: i64, offset: i64) {
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, clause: &FilterClause) {
    let column = clause.property;

    match (&clause.value, clause.operator) {
        (FilterValue::Null, FilterOperator::Not) => {
            builder.push(column).push(" IS NOT NULL");
        }
        (FilterValue::Null, _) => {
            builder.push(column).push(" IS NULL");
        }
        (FilterValue::List(items), op) => {
            builder.push(column);
            builder.push(if op == FilterOperator::NotIn {
                " NOT IN ("
            } else {
                " IN ("
            });
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                push_literal(builder, item);
            }
            builder.push(")");
        }
        (FilterValue::Single(literal), op) => {
            builder.push(column);
            builder.push(match op {
                FilterOperator::Not => " <> ",
                FilterOperator::Like => " LIKE ",
                FilterOperator::Lt => " < ",
                FilterOperator::Le => " <= ",
                FilterOperator::Ge => " >= ",
                FilterOperator::Gt => " > ",
                FilterOperator::Eq | FilterOperator::In | FilterOperator::NotIn => " = ",
            });
            push_literal(builder, literal);
        }
    }
}

fn push_literal(builder: &mut QueryBuilder<'_, Postgres>, literal: &FilterLiteral) {
    match literal {
        FilterLiteral::Text(v) => builder.push_bind(v.clone()),
        FilterLiteral::Integer(v) => builder.push_bind(*v),
        FilterLiteral::Boolean(v) => builder.push_bind(*v),
        FilterLiteral::Timestamp(v) => builder.push_bind(*v),
    };
}

/// Escapes `LIKE` metacharacters so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
