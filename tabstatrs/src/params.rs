//! Unvalidated query parameters.
//!
//! `QueryParams` is what callers hand to the builder. It can be assembled in
//! Rust with the `with_*` setters or decoded from JSON/YAML, in which case the
//! container and arity shapes are checked here before any catalog lookups.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Number, Value};

use crate::error::{Result, TabstatError};

/// One filter value as the caller wrote it. Numbers keep their JSON text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Number(Number),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub column: String,
    pub operator: String,
    pub value: FilterValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pub dimensions: Option<Vec<String>>,
    pub metrics: Vec<String>,
    pub aggregation: String,
    pub filters: Option<Vec<FilterClause>>,
    pub sort: Option<SortSpec>,
    pub limit: Option<i64>,
}

impl QueryParams {
    pub fn new<I, S>(metrics: I, aggregation: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metrics: metrics.into_iter().map(Into::into).collect(),
            aggregation: aggregation.into(),
            ..Self::default()
        }
    }

    pub fn with_dimensions<I, S>(mut self, dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimensions = Some(dimensions.into_iter().map(Into::into).collect());
        self
    }

    /// Append one `(column, operator, value)` clause.
    pub fn with_filter(
        mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Self {
        self.filters.get_or_insert_with(Vec::new).push(FilterClause {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_sort(mut self, column: impl Into<String>, direction: impl Into<String>) -> Self {
        self.sort = Some(SortSpec {
            column: column.into(),
            direction: direction.into(),
        });
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_json(&value)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(raw)?;
        Self::from_json(&value)
    }

    /// Decode parameters from a JSON document such as
    /// `{"dimensions": ["team"], "metrics": ["pts"], "aggregation": "sum",
    ///   "filters": [["fga", "ge", 10]], "sort": ["sum_pts", "desc"], "limit": 5}`.
    pub fn from_json(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(TabstatError::shape("params", "expected an object"));
        }
        let raw = RawParams::deserialize(value)
            .map_err(|e| TabstatError::shape("params", e.to_string()))?;

        let dimensions = raw
            .dimensions
            .map(|v| decode::<Vec<String>>("dimensions", v))
            .transpose()?;

        let metrics = match raw.metrics {
            Some(v) => decode::<Vec<String>>("metrics", v)?,
            None => return Err(TabstatError::EmptyField("metrics")),
        };

        let aggregation = match raw.aggregation {
            Some(v) => decode::<String>("aggregation", v)?,
            None => return Err(TabstatError::EmptyField("aggregation")),
        };

        let filters = match raw.filters {
            Some(v) => Some(
                decode::<Vec<Value>>("filters", v)?
                    .into_iter()
                    .enumerate()
                    .map(|(idx, item)| {
                        let (column, operator, value) = decode::<(String, String, FilterValue)>(
                            &format!("filters[{idx}]"),
                            item,
                        )?;
                        Ok(FilterClause {
                            column,
                            operator,
                            value,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };

        let sort = raw
            .sort
            .map(|v| decode::<(String, String)>("sort", v))
            .transpose()?
            .map(|(column, direction)| SortSpec { column, direction });

        let limit = raw
            .limit
            .map(|v| i64::deserialize(&v).map_err(|_| TabstatError::InvalidLimit(v.to_string())))
            .transpose()?;

        Ok(Self {
            dimensions,
            metrics,
            aggregation,
            filters,
            sort,
            limit,
        })
    }
}

/// Top-level keys of a params document. Explicit `null` decodes as `None`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawParams {
    dimensions: Option<Value>,
    metrics: Option<Value>,
    aggregation: Option<Value>,
    filters: Option<Value>,
    sort: Option<Value>,
    limit: Option<Value>,
}

/// Deserialize one field, reporting failures against that field's path.
fn decode<T: DeserializeOwned>(field: &str, value: Value) -> Result<T> {
    T::deserialize(value).map_err(|e| TabstatError::shape(field, e.to_string()))
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar::Number(value.into())
    }
}

/// Non-finite floats have no JSON number form; they are kept as text so the
/// numeric check rejects them.
impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        match Number::from_f64(value) {
            Some(n) => Scalar::Number(n),
            None => Scalar::String(value.to_string()),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<Scalar> for FilterValue {
    fn from(value: Scalar) -> Self {
        FilterValue::Scalar(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Scalar(value.into())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Scalar(value.into())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Scalar(value.into())
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Scalar(value.into())
    }
}

impl From<u64> for FilterValue {
    fn from(value: u64) -> Self {
        FilterValue::Scalar(value.into())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Scalar(value.into())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Scalar(value.into())
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        FilterValue::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn setters_compose() {
        let params = QueryParams::new(["pts"], "avg")
            .with_dimensions(["team_abbreviation"])
            .with_filter("fga", "ge", 10)
            .with_filter("team_abbreviation", "in", vec!["DEN", "LAL"])
            .with_sort("avg_pts", "desc")
            .with_limit(5);
        assert_eq!(params.metrics, vec!["pts"]);
        let filters = params.filters.unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(
            filters[0].value,
            FilterValue::Scalar(Scalar::Number(Number::from(10i64)))
        );
        assert_eq!(
            filters[1].value,
            FilterValue::List(vec!["DEN".into(), "LAL".into()])
        );
        assert_eq!(params.limit, Some(5));
    }

    #[test]
    fn null_fields_are_absent() {
        let params = QueryParams::from_json(&json!({
            "dimensions": null,
            "metrics": ["pts"],
            "aggregation": "avg",
            "filters": null,
            "sort": null,
            "limit": null
        }))
        .unwrap();
        assert_eq!(params.dimensions, None);
        assert_eq!(params.filters, None);
        assert_eq!(params.sort, None);
        assert_eq!(params.limit, None);
    }

    #[test]
    fn numbers_keep_their_json_text() {
        let params = QueryParams::from_json(&json!({
            "metrics": ["pts"],
            "aggregation": "avg",
            "filters": [
                ["fga", "ge", 10],
                ["pct", "lt", 0.5],
                ["id", "eq", 18446744073709551615u64]
            ]
        }))
        .unwrap();
        let rendered: Vec<String> = params
            .filters
            .unwrap()
            .into_iter()
            .map(|f| match f.value {
                FilterValue::Scalar(Scalar::Number(n)) => n.to_string(),
                other => panic!("expected a number, got {other:?}"),
            })
            .collect();
        assert_eq!(rendered, vec!["10", "0.5", "18446744073709551615"]);
    }

    #[test]
    fn non_finite_floats_stay_text() {
        assert_eq!(Scalar::from(f64::NAN), Scalar::String("NaN".into()));
        assert_eq!(Scalar::from(2.5), Scalar::Number(Number::from_f64(2.5).unwrap()));
    }

    #[test]
    fn rejects_bare_metric() {
        let err = QueryParams::from_json(&json!({"metrics": "pts", "aggregation": "sum"}))
            .unwrap_err();
        assert!(matches!(err, TabstatError::ShapeMismatch { ref field, .. } if field == "metrics"));
        assert!(err.to_string().contains("expected a sequence"), "{err}");
    }

    #[test]
    fn rejects_missing_required_fields() {
        let err = QueryParams::from_json(&json!({"aggregation": "sum"})).unwrap_err();
        assert!(matches!(err, TabstatError::EmptyField("metrics")));
        let err = QueryParams::from_json(&json!({"metrics": ["pts"]})).unwrap_err();
        assert!(matches!(err, TabstatError::EmptyField("aggregation")));
    }

    #[test]
    fn rejects_malformed_filters() {
        for filters in [
            json!("fga >= 10"),
            json!([["fga", "ge"]]),
            json!([["fga", "ge", 10, 11]]),
            json!([{"column": "fga"}]),
            json!([["fga", "ge", {"x": 1}]]),
            json!([["fga", "in", [1, [2]]]]),
            json!([[1, "ge", 10]]),
            json!([["fga", "eq", null]]),
        ] {
            let err = QueryParams::from_json(&json!({
                "metrics": ["pts"],
                "aggregation": "sum",
                "filters": filters.clone()
            }))
            .unwrap_err();
            assert!(
                matches!(err, TabstatError::ShapeMismatch { .. }),
                "{filters} gave {err:?}"
            );
        }
    }

    #[test]
    fn rejects_malformed_sort_and_limit() {
        let err = QueryParams::from_json(&json!({
            "metrics": ["pts"], "aggregation": "sum", "sort": ["sum_pts"]
        }))
        .unwrap_err();
        assert!(matches!(err, TabstatError::ShapeMismatch { ref field, .. } if field == "sort"));

        for limit in [json!(2.5), json!("10"), json!(true)] {
            let err = QueryParams::from_json(&json!({
                "metrics": ["pts"], "aggregation": "sum", "limit": limit
            }))
            .unwrap_err();
            assert!(matches!(err, TabstatError::InvalidLimit(_)));
        }
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = QueryParams::from_json(&json!({
            "metrics": ["pts"], "aggregation": "sum", "having": "x > 1"
        }))
        .unwrap_err();
        assert!(
            matches!(err, TabstatError::ShapeMismatch { ref field, .. } if field == "params"),
            "{err:?}"
        );
        assert!(err.to_string().contains("unknown field `having`"), "{err}");
    }

    #[test]
    fn decodes_yaml() {
        let params = QueryParams::from_yaml_str(
            r#"
dimensions: [team_abbreviation, player_name]
metrics: [pts, fga]
aggregation: max
sort: [max_pts, desc]
filters:
  - [team_abbreviation, nin, [DEN, LAL]]
limit: 10
"#,
        )
        .unwrap();
        assert_eq!(params.dimensions.unwrap().len(), 2);
        assert_eq!(params.sort.unwrap().column, "max_pts");
        assert_eq!(params.limit, Some(10));
    }
}
