use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TabstatError};

/// Fully-qualified `project.dataset.table` identifier of the target table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TablePath {
    project: String,
    dataset: String,
    table: String,
}

impl TablePath {
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self> {
        let path = Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
        };
        for part in [&path.project, &path.dataset, &path.table] {
            if !is_valid_part(part) {
                return Err(TabstatError::TablePath(path.to_string()));
            }
        }
        Ok(path)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split('.').collect();
        match parts.as_slice() {
            [project, dataset, table] => Self::new(*project, *dataset, *table)
                .map_err(|_| TabstatError::TablePath(raw.to_string())),
            _ => Err(TabstatError::TablePath(raw.to_string())),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Backtick-quoted form used as the `FROM` target.
    pub fn quoted(&self) -> String {
        format!("`{self}`")
    }
}

fn is_valid_part(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl fmt::Display for TablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

impl FromStr for TablePath {
    type Err = TabstatError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for TablePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TablePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TablePath::parse(&raw).map_err(serde::de::Error::custom)
    }
}
