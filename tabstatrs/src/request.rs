//! The validated request model.
//!
//! A `QueryRequest` can only be obtained through [`QueryRequest::validate`],
//! which checks every field of a [`QueryParams`] against the catalog and the
//! aggregation/operator registries and stops at the first violation. Once
//! built it is immutable; new parameters mean a new request.

use std::collections::HashSet;
use std::str::FromStr;

use crate::aggregation::Aggregation;
use crate::catalog::{Catalog, ColumnType};
use crate::error::{Result, TabstatError};
use crate::operand::Operand;
use crate::params::{FilterClause, FilterValue, QueryParams, Scalar, SortSpec};
use serde_json::Number;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = TabstatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(TabstatError::InvalidSortDirection(s.to_string())),
        }
    }
}

/// A filter literal whose SQL form has already been decided from the
/// column's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Written inside single quotes by the dialect.
    Quoted(String),
    /// Canonical text of a parsed finite number.
    Number(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOperand {
    Scalar(Literal),
    List(Vec<Literal>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub operand: &'static Operand,
    pub value: FilterOperand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Output name (dimension or metric alias) to order by.
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    dimensions: Option<Vec<String>>,
    metrics: Vec<String>,
    aggregation: &'static Aggregation,
    filters: Option<Vec<Filter>>,
    sort: Option<Sort>,
    limit: Option<u64>,
}

impl QueryRequest {
    pub fn validate(params: &QueryParams, catalog: &Catalog) -> Result<Self> {
        Self::validate_capped(params, catalog, 0)
    }

    /// Like [`validate`](Self::validate), additionally rejecting a limit above
    /// `max_row_limit` (0 disables the cap).
    pub fn validate_capped(
        params: &QueryParams,
        catalog: &Catalog,
        max_row_limit: u64,
    ) -> Result<Self> {
        let dimensions = validate_dimensions(params.dimensions.as_deref(), catalog)?;
        let metrics = validate_metrics(&params.metrics, catalog)?;
        let aggregation = Aggregation::lookup(&params.aggregation)?;
        check_output_names(dimensions.as_deref(), &metrics, aggregation)?;
        let filters = validate_filters(params.filters.as_deref(), catalog)?;
        let sort = validate_sort(
            params.sort.as_ref(),
            dimensions.as_deref(),
            &metrics,
            aggregation,
            catalog,
        )?;
        let limit = validate_limit(params.limit, max_row_limit)?;

        tracing::debug!(
            dimensions = dimensions.as_ref().map_or(0, Vec::len),
            metrics = metrics.len(),
            aggregation = aggregation.name(),
            filters = filters.as_ref().map_or(0, Vec::len),
            sorted = sort.is_some(),
            limit = ?limit,
            "validated query request"
        );

        Ok(Self {
            dimensions,
            metrics,
            aggregation,
            filters,
            sort,
            limit,
        })
    }

    pub fn dimensions(&self) -> &[String] {
        self.dimensions.as_deref().unwrap_or_default()
    }

    pub fn has_dimensions(&self) -> bool {
        self.dimensions.is_some()
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn aggregation(&self) -> &'static Aggregation {
        self.aggregation
    }

    pub fn filters(&self) -> &[Filter] {
        self.filters.as_deref().unwrap_or_default()
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Output name of each metric after aliasing, in request order.
    pub fn metric_outputs(&self) -> Vec<String> {
        self.metrics
            .iter()
            .map(|m| self.aggregation.output_name(m))
            .collect()
    }

    /// Every column of the rendered projection, in order.
    pub fn output_names(&self) -> Vec<String> {
        output_names(self.dimensions.as_deref(), &self.metrics, self.aggregation)
    }
}

fn output_names(
    dimensions: Option<&[String]>,
    metrics: &[String],
    aggregation: &Aggregation,
) -> Vec<String> {
    dimensions
        .unwrap_or_default()
        .iter()
        .cloned()
        .chain(metrics.iter().map(|m| aggregation.output_name(m)))
        .collect()
}

pub(crate) fn validate_dimensions(
    dimensions: Option<&[String]>,
    catalog: &Catalog,
) -> Result<Option<Vec<String>>> {
    let Some(dimensions) = dimensions else {
        return Ok(None);
    };
    if dimensions.is_empty() {
        return Err(TabstatError::EmptyField("dimensions"));
    }
    let mut seen = HashSet::new();
    for dim in dimensions {
        if !catalog.contains(dim) {
            return Err(TabstatError::UnknownColumn {
                field: "dimensions",
                column: dim.clone(),
            });
        }
        if !seen.insert(dim.as_str()) {
            return Err(TabstatError::DuplicateColumn {
                field: "dimensions",
                column: dim.clone(),
            });
        }
    }
    Ok(Some(dimensions.to_vec()))
}

pub(crate) fn validate_metrics(metrics: &[String], catalog: &Catalog) -> Result<Vec<String>> {
    if metrics.is_empty() {
        return Err(TabstatError::EmptyField("metrics"));
    }
    if let Some(missing) = metrics.iter().find(|m| !catalog.contains(m)) {
        return Err(TabstatError::UnknownColumn {
            field: "metrics",
            column: missing.clone(),
        });
    }
    Ok(metrics.to_vec())
}

/// The warehouse rejects duplicate result column names, so two metrics (or a
/// metric passed through unaggregated next to the same dimension) may not
/// collapse onto one output name.
fn check_output_names(
    dimensions: Option<&[String]>,
    metrics: &[String],
    aggregation: &Aggregation,
) -> Result<()> {
    let mut seen = HashSet::new();
    for name in output_names(dimensions, metrics, aggregation) {
        if !seen.insert(name.clone()) {
            return Err(TabstatError::DuplicateColumn {
                field: "metrics",
                column: name,
            });
        }
    }
    Ok(())
}

pub(crate) fn validate_filters(
    filters: Option<&[FilterClause]>,
    catalog: &Catalog,
) -> Result<Option<Vec<Filter>>> {
    let Some(filters) = filters else {
        return Ok(None);
    };
    if filters.is_empty() {
        return Err(TabstatError::EmptyField("filters"));
    }
    filters
        .iter()
        .enumerate()
        .map(|(idx, clause)| validate_filter(idx, clause, catalog))
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn validate_filter(idx: usize, clause: &FilterClause, catalog: &Catalog) -> Result<Filter> {
    let field = format!("filters[{idx}]");
    let column_type = catalog
        .column_type(&clause.column)
        .ok_or_else(|| TabstatError::UnknownColumn {
            field: "filters",
            column: clause.column.clone(),
        })?;
    let operand = Operand::lookup(&clause.operator).ok_or_else(|| {
        TabstatError::UnknownOperator {
            index: idx,
            operator: clause.operator.clone(),
        }
    })?;

    let value = match (&clause.value, operand.is_set()) {
        (FilterValue::List(items), true) => {
            if items.is_empty() {
                return Err(TabstatError::shape(
                    field,
                    format!("values for {} must not be empty", operand.name()),
                ));
            }
            FilterOperand::List(
                items
                    .iter()
                    .map(|item| literal(&field, &clause.column, column_type, item))
                    .collect::<Result<Vec<_>>>()?,
            )
        }
        (FilterValue::Scalar(value), false) => {
            FilterOperand::Scalar(literal(&field, &clause.column, column_type, value)?)
        }
        (FilterValue::Scalar(_), true) => {
            return Err(TabstatError::shape(
                field,
                format!("operator {} expects a list of values", operand.name()),
            ))
        }
        (FilterValue::List(_), false) => {
            return Err(TabstatError::shape(
                field,
                format!("operator {} expects a single value", operand.name()),
            ))
        }
    };

    tracing::debug!(
        column = %clause.column,
        operator = operand.name(),
        "accepted filter"
    );

    Ok(Filter {
        column: clause.column.clone(),
        operand,
        value,
    })
}

/// Decide the SQL form of one value from the column's declared type.
///
/// Values are never rewritten: numbers keep the caller's text and anything
/// that does not fit the column's literal form exactly is rejected.
fn literal(field: &str, column: &str, column_type: ColumnType, value: &Scalar) -> Result<Literal> {
    let mismatch = |what: &str| {
        TabstatError::shape(
            field,
            format!("{what} is not a valid literal for column {column} ({column_type:?})"),
        )
    };
    if column_type.is_quoted() {
        return match value {
            Scalar::String(s) => Ok(Literal::Quoted(s.clone())),
            other => Err(mismatch(&format!("{other:?}"))),
        };
    }
    match column_type {
        ColumnType::Numeric => match value {
            Scalar::Number(n) if is_exact(n) => Ok(Literal::Number(n.to_string())),
            Scalar::String(s) if is_decimal(s) => Ok(Literal::Number(s.clone())),
            other => Err(mismatch(&format!("{other:?}"))),
        },
        ColumnType::Boolean => match value {
            Scalar::Bool(b) => Ok(Literal::Bool(*b)),
            Scalar::String(s) if s.eq_ignore_ascii_case("true") => Ok(Literal::Bool(true)),
            Scalar::String(s) if s.eq_ignore_ascii_case("false") => Ok(Literal::Bool(false)),
            other => Err(mismatch(&format!("{other:?}"))),
        },
        _ => Err(mismatch(&format!("{value:?}"))),
    }
}

/// Integral floats past 2^53 have already lost digits; pass those as strings.
fn is_exact(n: &Number) -> bool {
    match n.as_f64() {
        Some(f) if n.is_f64() => f.fract() != 0.0 || f.abs() < 9_007_199_254_740_992.0,
        _ => true,
    }
}

/// `-?(digits[.digits?] | .digits)([eE][+-]?digits)?` with nothing around it.
fn is_decimal(raw: &str) -> bool {
    fn digits(bytes: &[u8], mut pos: usize) -> usize {
        while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        pos
    }

    let bytes = raw.as_bytes();
    let mut pos = usize::from(bytes.first() == Some(&b'-'));
    let int_end = digits(bytes, pos);
    let mut mantissa = int_end > pos;
    pos = int_end;
    if bytes.get(pos) == Some(&b'.') {
        let frac_end = digits(bytes, pos + 1);
        mantissa |= frac_end > pos + 1;
        pos = frac_end;
    }
    if !mantissa {
        return false;
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let exp_end = digits(bytes, pos);
        if exp_end == pos {
            return false;
        }
        pos = exp_end;
    }
    pos == bytes.len()
}

pub(crate) fn validate_sort(
    sort: Option<&SortSpec>,
    dimensions: Option<&[String]>,
    metrics: &[String],
    aggregation: &Aggregation,
    catalog: &Catalog,
) -> Result<Option<Sort>> {
    let Some(sort) = sort else {
        return Ok(None);
    };
    let direction = sort.direction.parse::<SortDirection>()?;
    let available = output_names(dimensions, metrics, aggregation);
    if available.iter().any(|name| *name == sort.column) {
        return Ok(Some(Sort {
            column: sort.column.clone(),
            direction,
        }));
    }
    if catalog.contains(&sort.column) {
        Err(TabstatError::UnsortableColumn {
            column: sort.column.clone(),
            available,
        })
    } else {
        Err(TabstatError::UnknownColumn {
            field: "sort",
            column: sort.column.clone(),
        })
    }
}

pub(crate) fn validate_limit(limit: Option<i64>, max_row_limit: u64) -> Result<Option<u64>> {
    let Some(limit) = limit else {
        return Ok(None);
    };
    let positive = u64::try_from(limit)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| TabstatError::InvalidLimit(limit.to_string()))?;
    if max_row_limit > 0 && positive > max_row_limit {
        return Err(TabstatError::InvalidLimit(format!(
            "{positive} (above max_row_limit {max_row_limit})"
        )));
    }
    Ok(Some(positive))
}
