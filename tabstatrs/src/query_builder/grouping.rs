use crate::dialect::Dialect;
use crate::request::QueryRequest;

/// `GROUP BY` over the dimensions, only for grouped aggregations with
/// dimensions. Window aggregations group inside their `OVER` clause instead.
pub(crate) fn group_by_clause(request: &QueryRequest, dialect: &dyn Dialect) -> String {
    if !request.aggregation().is_grouped() || !request.has_dimensions() {
        return String::new();
    }
    tracing::debug!(
        dimensions = ?request.dimensions(),
        aggregation = request.aggregation().name(),
        "grouping metrics"
    );
    format!("GROUP BY {}", dimension_list(request, dialect))
}

/// Body of the `OVER (...)` clause for window aggregations.
pub(crate) fn window_spec(request: &QueryRequest, dialect: &dyn Dialect) -> String {
    if request.has_dimensions() {
        format!("PARTITION BY {}", dimension_list(request, dialect))
    } else {
        String::new()
    }
}

fn dimension_list(request: &QueryRequest, dialect: &dyn Dialect) -> String {
    request
        .dimensions()
        .iter()
        .map(|d| dialect.quote_ident(d))
        .collect::<Vec<_>>()
        .join(", ")
}
