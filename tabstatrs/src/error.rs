use thiserror::Error;

pub type Result<T> = std::result::Result<T, TabstatError>;

#[derive(Debug, Error)]
pub enum TabstatError {
    #[error("unknown column {column} in {field}")]
    UnknownColumn { field: &'static str, column: String },
    #[error("unknown aggregation {name}; expected one of [{}]", .expected.join(", "))]
    UnknownAggregation { name: String, expected: Vec<String> },
    #[error("filter[{index}]: unknown operator {operator}")]
    UnknownOperator { index: usize, operator: String },
    #[error("{field}: {message}")]
    ShapeMismatch { field: String, message: String },
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("duplicate column {column} in {field}")]
    DuplicateColumn { field: &'static str, column: String },
    #[error("invalid sort direction {0}; expected asc or desc")]
    InvalidSortDirection(String),
    #[error("cannot sort by {column}; output columns are [{}]", .available.join(", "))]
    UnsortableColumn {
        column: String,
        available: Vec<String>,
    },
    #[error("invalid limit {0}; expected a positive integer")]
    InvalidLimit(String),
    #[error("invalid table path {0}; expected project.dataset.table")]
    TablePath(String),
    #[error("table {0} does not exist")]
    TableNotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("execution error: {0}")]
    Execution(String),
    #[error("query timed out after {0}ms")]
    Timeout(u64),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TabstatError {
    pub(crate) fn shape(field: impl Into<String>, message: impl Into<String>) -> Self {
        TabstatError::ShapeMismatch {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Caller-fixable request errors. These are never worth retrying.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TabstatError::UnknownColumn { .. }
                | TabstatError::UnknownAggregation { .. }
                | TabstatError::UnknownOperator { .. }
                | TabstatError::ShapeMismatch { .. }
                | TabstatError::EmptyField(_)
                | TabstatError::DuplicateColumn { .. }
                | TabstatError::InvalidSortDirection(_)
                | TabstatError::UnsortableColumn { .. }
                | TabstatError::InvalidLimit(_)
        )
    }
}
