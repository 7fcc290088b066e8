//! Aggregation registry.
//!
//! Each entry maps a name to a SQL template with a `{metric}` placeholder and,
//! for window functions, a `{window}` placeholder holding the partition spec.
//! The table is built once and only ever read.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::error::{Result, TabstatError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationKind {
    /// Collapses each dimension group to one row via `GROUP BY`.
    Grouped,
    /// Computed per row over a partition via `OVER`; never paired with `GROUP BY`.
    Window,
    /// Passes the metric through unchanged.
    Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregation {
    name: &'static str,
    kind: AggregationKind,
    template: &'static str,
}

const fn grouped(name: &'static str, template: &'static str) -> Aggregation {
    Aggregation {
        name,
        kind: AggregationKind::Grouped,
        template,
    }
}

const fn window(name: &'static str, template: &'static str) -> Aggregation {
    Aggregation {
        name,
        kind: AggregationKind::Window,
        template,
    }
}

const ENTRIES: &[Aggregation] = &[
    grouped("avg", "AVG({metric})"),
    grouped("sum", "SUM({metric})"),
    grouped("min", "MIN({metric})"),
    grouped("max", "MAX({metric})"),
    grouped("count", "COUNT({metric})"),
    grouped("count_distinct", "COUNT(DISTINCT {metric})"),
    grouped("count_nulls", "COUNTIF({metric} IS NULL)"),
    grouped("any_value", "ANY_VALUE({metric})"),
    grouped("array_agg", "ARRAY_AGG({metric} IGNORE NULLS)"),
    grouped("array_agg_distinct", "ARRAY_AGG(DISTINCT {metric} IGNORE NULLS)"),
    grouped("string_agg", "STRING_AGG(CAST({metric} AS STRING), ',')"),
    grouped(
        "string_agg_distinct",
        "STRING_AGG(DISTINCT CAST({metric} AS STRING), ',')",
    ),
    grouped("stddev_samp", "STDDEV_SAMP({metric})"),
    grouped("var_samp", "VAR_SAMP({metric})"),
    window("median", "PERCENTILE_CONT({metric}, 0.5) OVER ({window})"),
    window("q1", "PERCENTILE_CONT({metric}, 0.25) OVER ({window})"),
    window("q3", "PERCENTILE_CONT({metric}, 0.75) OVER ({window})"),
    window("p90", "PERCENTILE_CONT({metric}, 0.9) OVER ({window})"),
    window("p95", "PERCENTILE_CONT({metric}, 0.95) OVER ({window})"),
    window("p99", "PERCENTILE_CONT({metric}, 0.99) OVER ({window})"),
    window("std", "STDDEV_POP({metric}) OVER ({window})"),
    window("var", "VAR_POP({metric}) OVER ({window})"),
    window("running_min", "MIN({metric}) OVER ({window})"),
    window("running_max", "MAX({metric}) OVER ({window})"),
    Aggregation {
        name: "raw",
        kind: AggregationKind::Identity,
        template: "{metric}",
    },
];

/// Alternate spellings resolved to a canonical entry.
const ALIASES: &[(&str, &str)] = &[("mean", "avg")];

static REGISTRY: Lazy<BTreeMap<&'static str, Aggregation>> =
    Lazy::new(|| ENTRIES.iter().map(|agg| (agg.name, *agg)).collect());

impl Aggregation {
    pub fn lookup(name: &str) -> Result<&'static Aggregation> {
        let canonical = ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, target)| *target)
            .unwrap_or(name);
        REGISTRY
            .get(canonical)
            .ok_or_else(|| TabstatError::UnknownAggregation {
                name: name.to_string(),
                expected: Self::names().map(str::to_string).collect(),
            })
    }

    /// Registered names in sorted order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        REGISTRY.keys().copied()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> AggregationKind {
        self.kind
    }

    pub fn is_grouped(&self) -> bool {
        self.kind == AggregationKind::Grouped
    }

    pub fn is_window(&self) -> bool {
        self.kind == AggregationKind::Window
    }

    /// Name the rendered metric is aliased to: the metric itself for the
    /// identity entry, `<aggregation>_<metric>` otherwise.
    pub fn output_name(&self, metric: &str) -> String {
        match self.kind {
            AggregationKind::Identity => metric.to_string(),
            _ => format!("{}_{}", self.name, metric),
        }
    }

    /// Fill the template. `window` is the body of the `OVER (...)` clause and
    /// is ignored by non-window entries.
    pub fn render(&self, metric: &str, window: &str) -> String {
        self.template
            .replace("{window}", window)
            .replace("{metric}", metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_and_window_sets_are_disjoint() {
        let grouped: Vec<_> = ENTRIES.iter().filter(|a| a.is_grouped()).collect();
        let windowed: Vec<_> = ENTRIES.iter().filter(|a| a.is_window()).collect();
        assert!(grouped.iter().all(|a| !a.template.contains("OVER")));
        assert!(windowed.iter().all(|a| a.template.contains("OVER ({window})")));
        assert_eq!(REGISTRY.len(), ENTRIES.len());
    }

    #[test]
    fn renders_templates() {
        let sum = Aggregation::lookup("sum").unwrap();
        assert_eq!(sum.render("pts", ""), "SUM(pts)");
        assert_eq!(sum.output_name("pts"), "sum_pts");

        let median = Aggregation::lookup("median").unwrap();
        assert_eq!(
            median.render("pts", "PARTITION BY team"),
            "PERCENTILE_CONT(pts, 0.5) OVER (PARTITION BY team)"
        );
        assert_eq!(median.render("pts", ""), "PERCENTILE_CONT(pts, 0.5) OVER ()");

        let raw = Aggregation::lookup("raw").unwrap();
        assert_eq!(raw.kind(), AggregationKind::Identity);
        assert_eq!(raw.render("pts", "PARTITION BY team"), "pts");
        assert_eq!(raw.output_name("pts"), "pts");
    }

    #[test]
    fn resolves_aliases() {
        let mean = Aggregation::lookup("mean").unwrap();
        assert_eq!(mean.name(), "avg");
        assert_eq!(mean.output_name("pts"), "avg_pts");
    }

    #[test]
    fn unknown_names_list_the_registry() {
        let err = Aggregation::lookup("mad").unwrap_err();
        match err {
            TabstatError::UnknownAggregation { name, expected } => {
                assert_eq!(name, "mad");
                assert!(expected.contains(&"median".to_string()));
                assert!(expected.windows(2).all(|w| w[0] <= w[1]));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(Aggregation::lookup("AVG").is_err());
    }
}
