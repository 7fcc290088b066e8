use crate::dialect::Dialect;
use crate::request::{Filter, FilterOperand, Literal, QueryRequest};

/// Filter text appended after `WHERE 1=1`: one `AND ...` per filter in input
/// order, empty when there are none.
pub(crate) fn filter_clause(request: &QueryRequest, dialect: &dyn Dialect) -> String {
    request
        .filters()
        .iter()
        .map(|f| render_filter(f, dialect))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_filter(filter: &Filter, dialect: &dyn Dialect) -> String {
    let value = match &filter.value {
        FilterOperand::Scalar(literal) => render_literal(literal, dialect),
        FilterOperand::List(items) => {
            let rendered: Vec<String> = items
                .iter()
                .map(|item| render_literal(item, dialect))
                .collect();
            format!("({})", rendered.join(", "))
        }
    };
    format!(
        "AND {} {} {}",
        dialect.quote_ident(&filter.column),
        filter.operand.symbol(),
        value
    )
}

fn render_literal(literal: &Literal, dialect: &dyn Dialect) -> String {
    match literal {
        Literal::Quoted(s) => dialect.quote_string(s),
        Literal::Number(n) => n.clone(),
        Literal::Bool(true) => "TRUE".to_string(),
        Literal::Bool(false) => "FALSE".to_string(),
    }
}
