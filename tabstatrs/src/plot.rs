//! Plot data preparation.
//!
//! Derives which result columns feed which axis of a chart from the request
//! that produced the result, and extracts the plotted values. Drawing is left
//! to the caller.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, TabstatError};
use crate::executor::QueryResult;
use crate::request::QueryRequest;

/// Name of the synthetic category column used when a request has several
/// dimensions.
pub const GROUP_COLUMN: &str = "group";

const GROUP_SEPARATOR: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotKind {
    Bar,
    Barh,
    Box,
    Scatter,
    Histogram,
}

impl PlotKind {
    pub const ALL: [PlotKind; 5] = [
        PlotKind::Bar,
        PlotKind::Barh,
        PlotKind::Box,
        PlotKind::Scatter,
        PlotKind::Histogram,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlotKind::Bar => "bar",
            PlotKind::Barh => "barh",
            PlotKind::Box => "box",
            PlotKind::Scatter => "scatter",
            PlotKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlotKind {
    type Err = TabstatError;

    fn from_str(s: &str) -> Result<Self> {
        PlotKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let expected: Vec<&str> = PlotKind::ALL.iter().map(|k| k.as_str()).collect();
                TabstatError::shape(
                    "plot",
                    format!("unknown plot kind {s}; expected one of [{}]", expected.join(", ")),
                )
            })
    }
}

/// One plotted observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlotPoint {
    /// Bar, barh and box charts.
    Category { label: String, value: f64 },
    /// Scatter charts; `label` is the category when the request had dimensions.
    Pair { label: Option<String>, x: f64, y: f64 },
    /// Histograms.
    Sample(f64),
}

/// Column-to-axis assignment for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotAxes {
    pub kind: PlotKind,
    /// Category axis: the single dimension, or [`GROUP_COLUMN`].
    pub category: Option<String>,
    /// Dimensions joined to form the category label.
    pub group_by: Vec<String>,
    /// First metric's output column.
    pub value: String,
    /// Second metric's output column (scatter y axis).
    pub second_value: Option<String>,
}

impl PlotAxes {
    pub fn for_request(request: &QueryRequest, kind: PlotKind) -> Result<Self> {
        let outputs = request.metric_outputs();
        let dimensions = request.dimensions().to_vec();

        let Some(value) = outputs.first().cloned() else {
            return Err(TabstatError::EmptyField("metrics"));
        };

        let second_value = match kind {
            PlotKind::Scatter => match outputs.get(1) {
                Some(second) => Some(second.clone()),
                None => {
                    return Err(TabstatError::shape(
                        "plot",
                        "scatter needs two metrics (x and y)",
                    ))
                }
            },
            _ => None,
        };

        match kind {
            PlotKind::Histogram if !dimensions.is_empty() => {
                return Err(TabstatError::shape(
                    "plot",
                    "histogram takes no dimensions",
                ))
            }
            PlotKind::Bar | PlotKind::Barh | PlotKind::Box if dimensions.is_empty() => {
                return Err(TabstatError::shape(
                    "plot",
                    format!("{kind} needs at least one dimension"),
                ))
            }
            _ => {}
        }

        let category = match dimensions.len() {
            0 => None,
            1 => Some(dimensions[0].clone()),
            _ => Some(GROUP_COLUMN.to_string()),
        };

        Ok(Self {
            kind,
            category,
            group_by: dimensions,
            value,
            second_value,
        })
    }

    /// Extract plotted values from `result`. Rows whose value cells are null
    /// or non-numeric are skipped.
    pub fn series(&self, result: &QueryResult) -> Vec<PlotPoint> {
        let points: Vec<PlotPoint> = result
            .rows
            .iter()
            .filter_map(|row| {
                let value = row.get(&self.value).and_then(numeric)?;
                let label = self.label(row);
                match (self.kind, &self.second_value) {
                    (PlotKind::Histogram, _) => Some(PlotPoint::Sample(value)),
                    (PlotKind::Scatter, Some(second)) => {
                        let y = row.get(second).and_then(numeric)?;
                        Some(PlotPoint::Pair { label, x: value, y })
                    }
                    _ => label.map(|label| PlotPoint::Category { label, value }),
                }
            })
            .collect();
        tracing::debug!(
            kind = %self.kind,
            rows = result.len(),
            points = points.len(),
            "prepared plot series"
        );
        points
    }

    fn label(&self, row: &serde_json::Map<String, Value>) -> Option<String> {
        if self.group_by.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .group_by
            .iter()
            .map(|dim| row.get(dim).map(label_text).unwrap_or_default())
            .collect();
        Some(parts.join(GROUP_SEPARATOR))
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // BigQuery returns INT64/NUMERIC cells as strings.
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
