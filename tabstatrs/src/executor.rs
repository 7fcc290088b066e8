//! Tabular query results as returned by a warehouse.

use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMeta {
    pub name: String,
}

/// Rows keyed by output column name, in result order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Map<String, Value>>,
}

impl QueryResult {
    pub fn new(columns: Vec<ColumnMeta>, rows: Vec<Map<String, Value>>) -> Self {
        Self { columns, rows }
    }

    /// Build a result from column names and positional rows.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<ColumnMeta> = columns
            .into_iter()
            .map(|name| ColumnMeta { name: name.into() })
            .collect();
        let rows = rows
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(row)
                    .map(|(col, value)| (col.name.clone(), value))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column, `Null` where a row lacks it.
    pub fn column(&self, name: &str) -> Vec<&Value> {
        static NULL: Value = Value::Null;
        self.rows
            .iter()
            .map(|row| row.get(name).unwrap_or(&NULL))
            .collect()
    }
}
