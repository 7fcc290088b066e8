//! Decoding query parameters from JSON and YAML documents.

use std::sync::Arc;

use serde_json::json;
use tabstat::params::{FilterValue, Scalar};
use tabstat::{Catalog, QueryParams, SqlBuilder, TablePath, TabstatError};

fn builder() -> SqlBuilder {
    let catalog = Catalog::from_pairs([
        ("team_abbreviation", "STRING"),
        ("pts", "INT64"),
        ("fga", "INT64"),
    ]);
    SqlBuilder::new(
        TablePath::parse("project.dataset.table").unwrap(),
        Arc::new(catalog),
    )
}

const END_TO_END: &str = "SELECT team_abbreviation, AVG(pts) AS avg_pts FROM `project.dataset.table` \
                          WHERE 1=1 AND fga >= 10 GROUP BY team_abbreviation ORDER BY avg_pts DESC LIMIT 5";

#[test]
fn json_document_builds_expected_sql() {
    let params = QueryParams::from_json_str(
        r#"{
            "dimensions": ["team_abbreviation"],
            "metrics": ["pts"],
            "aggregation": "avg",
            "filters": [["fga", "ge", 10]],
            "sort": ["avg_pts", "desc"],
            "limit": 5
        }"#,
    )
    .unwrap();
    assert_eq!(builder().build(&params).unwrap(), END_TO_END);
}

#[test]
fn yaml_document_matches_json() {
    let yaml = QueryParams::from_yaml_str(
        r#"
dimensions: [team_abbreviation]
metrics: [pts]
aggregation: avg
filters:
  - [fga, ge, 10]
sort: [avg_pts, desc]
limit: 5
"#,
    )
    .unwrap();
    let typed = QueryParams::new(["pts"], "avg")
        .with_dimensions(["team_abbreviation"])
        .with_filter("fga", "ge", 10i64)
        .with_sort("avg_pts", "desc")
        .with_limit(5);
    assert_eq!(yaml, typed);
    assert_eq!(builder().build(&yaml).unwrap(), END_TO_END);
}

#[test]
fn null_fields_count_as_absent() {
    let params = QueryParams::from_json(&json!({
        "dimensions": null,
        "metrics": ["pts"],
        "aggregation": "sum",
        "filters": null,
        "sort": null,
        "limit": null,
    }))
    .unwrap();
    assert_eq!(params, QueryParams::new(["pts"], "sum"));
}

#[test]
fn filter_values_keep_their_json_types() {
    let params = QueryParams::from_json(&json!({
        "metrics": ["pts"],
        "aggregation": "sum",
        "filters": [
            ["team_abbreviation", "in", ["DEN", "LAL"]],
            ["pts", "gt", 20.5],
            ["fga", "eq", true],
        ],
    }))
    .unwrap();
    let values: Vec<FilterValue> = params
        .filters
        .unwrap()
        .into_iter()
        .map(|f| f.value)
        .collect();
    assert_eq!(
        values,
        vec![
            FilterValue::List(vec![
                Scalar::String("DEN".into()),
                Scalar::String("LAL".into())
            ]),
            FilterValue::Scalar(Scalar::Number(serde_json::Number::from_f64(20.5).unwrap())),
            FilterValue::Scalar(Scalar::Bool(true)),
        ]
    );
}

#[test]
fn large_json_integers_render_exactly() {
    let params = QueryParams::from_json_str(
        r#"{"metrics": ["pts"], "aggregation": "sum", "filters": [["game_id", "eq", 18446744073709551615]]}"#,
    )
    .unwrap();
    let builder = SqlBuilder::new(
        TablePath::parse("project.dataset.table").unwrap(),
        Arc::new(Catalog::from_pairs([("pts", "INT64"), ("game_id", "NUMERIC")])),
    );
    assert_eq!(
        builder.build(&params).unwrap(),
        "SELECT SUM(pts) AS sum_pts FROM `project.dataset.table` WHERE 1=1 AND game_id = 18446744073709551615"
    );
}

#[test]
fn bare_scalar_metric_is_a_shape_error() {
    let err = QueryParams::from_json(&json!({"metrics": "pts", "aggregation": "sum"})).unwrap_err();
    assert!(
        matches!(err, TabstatError::ShapeMismatch { ref field, .. } if field == "metrics"),
        "{err:?}"
    );
}

#[test]
fn required_fields_must_be_present() {
    let err = QueryParams::from_json(&json!({"aggregation": "sum"})).unwrap_err();
    assert!(matches!(err, TabstatError::EmptyField("metrics")));

    let err = QueryParams::from_json(&json!({"metrics": ["pts"]})).unwrap_err();
    assert!(matches!(err, TabstatError::EmptyField("aggregation")));
}

#[test]
fn unknown_keys_are_rejected() {
    let err = QueryParams::from_json(&json!({
        "metrics": ["pts"],
        "aggregation": "sum",
        "order_by": ["pts", "asc"],
    }))
    .unwrap_err();
    assert!(matches!(err, TabstatError::ShapeMismatch { .. }), "{err:?}");
    assert!(err.to_string().contains("order_by"), "{err}");
}

#[test]
fn filter_and_sort_arity_is_checked() {
    let err = QueryParams::from_json(&json!({
        "metrics": ["pts"],
        "aggregation": "sum",
        "filters": [["fga", "ge"]],
    }))
    .unwrap_err();
    assert!(
        matches!(err, TabstatError::ShapeMismatch { ref field, .. } if field == "filters[0]"),
        "{err:?}"
    );

    let err = QueryParams::from_json(&json!({
        "metrics": ["pts"],
        "aggregation": "sum",
        "sort": ["sum_pts", "desc", "nulls_last"],
    }))
    .unwrap_err();
    assert!(
        matches!(err, TabstatError::ShapeMismatch { ref field, .. } if field == "sort"),
        "{err:?}"
    );

    let err = QueryParams::from_json(&json!({
        "metrics": ["pts"],
        "aggregation": "sum",
        "filters": {"fga": 10},
    }))
    .unwrap_err();
    assert!(matches!(err, TabstatError::ShapeMismatch { .. }), "{err:?}");
}

#[test]
fn nested_list_values_are_rejected() {
    let err = QueryParams::from_json(&json!({
        "metrics": ["pts"],
        "aggregation": "sum",
        "filters": [["fga", "in", [[1, 2]]]],
    }))
    .unwrap_err();
    assert!(matches!(err, TabstatError::ShapeMismatch { .. }), "{err:?}");
}

#[test]
fn non_integer_limit_is_invalid() {
    for limit in [json!(5.5), json!("10")] {
        let err = QueryParams::from_json(&json!({
            "metrics": ["pts"],
            "aggregation": "sum",
            "limit": limit,
        }))
        .unwrap_err();
        assert!(matches!(err, TabstatError::InvalidLimit(_)), "{err:?}");
    }
}

#[test]
fn root_must_be_an_object() {
    assert!(matches!(
        QueryParams::from_json_str("[1, 2, 3]"),
        Err(TabstatError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        QueryParams::from_json_str("{not json"),
        Err(TabstatError::Json(_))
    ));
}
