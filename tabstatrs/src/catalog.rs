//! Column catalog of the bound table.
//!
//! The catalog is a read-only fact base: every identifier that reaches the
//! SQL renderer has been checked against it first.

use std::collections::HashMap;

use crate::schema_cache::{ColumnSchema, TableSchema};

/// Coarse classification of a declared warehouse type, used to decide how
/// filter literals are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Temporal,
    Numeric,
    Boolean,
    Other,
}

impl ColumnType {
    pub fn classify(data_type: &str) -> Self {
        let base = data_type
            .split(|c: char| c == '(' || c == '<')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_uppercase();
        match base.as_str() {
            "STRING" | "VARCHAR" | "TEXT" | "CHAR" => ColumnType::Text,
            "DATE" | "DATETIME" | "TIME" | "TIMESTAMP" => ColumnType::Temporal,
            "INT64" | "INT" | "INTEGER" | "SMALLINT" | "BIGINT" | "TINYINT" | "BYTEINT"
            | "FLOAT64" | "FLOAT" | "DOUBLE" | "NUMERIC" | "DECIMAL" | "BIGNUMERIC"
            | "BIGDECIMAL" => ColumnType::Numeric,
            "BOOL" | "BOOLEAN" => ColumnType::Boolean,
            _ => ColumnType::Other,
        }
    }

    /// Literals for these types are written inside single quotes.
    pub fn is_quoted(self) -> bool {
        matches!(self, ColumnType::Text | ColumnType::Temporal)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    columns: Vec<ColumnSchema>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn from_schema(schema: &TableSchema) -> Self {
        let mut catalog = Catalog::default();
        for column in &schema.columns {
            catalog.push(column.clone());
        }
        catalog
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut catalog = Catalog::default();
        for (name, data_type) in pairs {
            catalog.push(ColumnSchema {
                name: name.into(),
                data_type: data_type.into(),
                nullable: true,
            });
        }
        catalog
    }

    fn push(&mut self, column: ColumnSchema) {
        match self.index.get(&column.name) {
            Some(&idx) => self.columns[idx] = column,
            None => {
                self.index.insert(column.name.clone(), self.columns.len());
                self.columns.push(column);
            }
        }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn data_type(&self, column: &str) -> Option<&str> {
        self.index
            .get(column)
            .map(|&idx| self.columns[idx].data_type.as_str())
    }

    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.data_type(column).map(ColumnType::classify)
    }

    /// Columns in the order the warehouse reported them.
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_warehouse_types() {
        assert_eq!(ColumnType::classify("STRING"), ColumnType::Text);
        assert_eq!(ColumnType::classify("String"), ColumnType::Text);
        assert_eq!(ColumnType::classify("STRING(20)"), ColumnType::Text);
        assert_eq!(ColumnType::classify("INT64"), ColumnType::Numeric);
        assert_eq!(ColumnType::classify("Float64"), ColumnType::Numeric);
        assert_eq!(ColumnType::classify("NUMERIC(10, 2)"), ColumnType::Numeric);
        assert_eq!(ColumnType::classify("TIMESTAMP"), ColumnType::Temporal);
        assert_eq!(ColumnType::classify("BOOL"), ColumnType::Boolean);
        assert_eq!(ColumnType::classify("ARRAY<STRING>"), ColumnType::Other);
        assert_eq!(ColumnType::classify("GEOGRAPHY"), ColumnType::Other);
    }

    #[test]
    fn lookups_follow_schema() {
        let catalog = Catalog::from_pairs([
            ("team_abbreviation", "STRING"),
            ("pts", "INT64"),
            ("pts", "FLOAT64"),
        ]);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("pts"));
        assert!(!catalog.contains("PTS"));
        assert_eq!(catalog.data_type("pts"), Some("FLOAT64"));
        assert_eq!(
            catalog.column_type("team_abbreviation"),
            Some(ColumnType::Text)
        );
        assert_eq!(catalog.columns()[0].name, "team_abbreviation");
    }
}
