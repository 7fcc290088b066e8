use crate::aggregation::AggregationKind;
use crate::dialect::Dialect;
use crate::request::QueryRequest;

use super::grouping::window_spec;

/// `SELECT` list: bare dimensions, then each metric rendered through the
/// aggregation template and aliased to its output name.
pub(crate) fn projection_clause(request: &QueryRequest, dialect: &dyn Dialect) -> String {
    let aggregation = request.aggregation();
    let window = if aggregation.is_window() {
        window_spec(request, dialect)
    } else {
        String::new()
    };

    let metrics = request.metrics().iter().map(|metric| {
        let expr = aggregation.render(&dialect.quote_ident(metric), &window);
        if aggregation.kind() == AggregationKind::Identity {
            expr
        } else {
            let alias = dialect.quote_ident(&aggregation.output_name(metric));
            format!("{expr} AS {alias}")
        }
    });

    request
        .dimensions()
        .iter()
        .map(|d| dialect.quote_ident(d))
        .chain(metrics)
        .collect::<Vec<_>>()
        .join(", ")
}
