use crate::dialect::Dialect;
use crate::request::QueryRequest;
use crate::table_path::TablePath;

use super::filters::filter_clause;
use super::grouping::group_by_clause;
use super::projection::projection_clause;

/// `ORDER BY` on an output name (post-alias), empty when unsorted.
pub(crate) fn order_by_clause(request: &QueryRequest, dialect: &dyn Dialect) -> String {
    match request.sort() {
        Some(sort) => {
            tracing::debug!(column = %sort.column, direction = sort.direction.as_sql(), "sorting");
            format!(
                "ORDER BY {} {}",
                dialect.quote_ident(&sort.column),
                sort.direction.as_sql()
            )
        }
        None => String::new(),
    }
}

pub(crate) fn limit_clause(request: &QueryRequest) -> String {
    request
        .limit()
        .map(|n| format!("LIMIT {n}"))
        .unwrap_or_default()
}

/// Assemble the final query. Clause order is fixed:
/// projection, `FROM`, `WHERE 1=1` + filters, grouping, sort, limit.
pub fn render_query(request: &QueryRequest, table: &TablePath, dialect: &dyn Dialect) -> String {
    let mut sql = format!(
        "SELECT {} FROM {} WHERE 1=1",
        projection_clause(request, dialect),
        dialect.qualify_table(table)
    );
    for clause in [
        filter_clause(request, dialect),
        group_by_clause(request, dialect),
        order_by_clause(request, dialect),
        limit_clause(request),
    ] {
        if !clause.is_empty() {
            sql.push(' ');
            sql.push_str(&clause);
        }
    }
    sql
}
