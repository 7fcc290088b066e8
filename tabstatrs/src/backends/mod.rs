//! Warehouse backends.
//!
//! A warehouse answers two questions for a session: what columns a table has,
//! and what rows a query returns. Concrete clients are gated behind feature flags.

use std::sync::Arc;

use async_trait::async_trait;

use crate::dialect::Dialect;
use crate::error::Result;
use crate::executor::QueryResult;
use crate::schema_cache::TableSchema;
use crate::table_path::TablePath;

/// Schema provider and query executor for one warehouse.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Dialect the session renders SQL in for this warehouse.
    fn dialect(&self) -> Arc<dyn Dialect + Send + Sync>;
    async fn table_exists(&self, table: &TablePath) -> Result<bool>;
    async fn fetch_schema(&self, table: &TablePath) -> Result<TableSchema>;
    async fn execute_sql(&self, sql: &str) -> Result<QueryResult>;
}

#[cfg(feature = "bigquery")]
mod bigquery;
#[cfg(feature = "bigquery")]
pub use bigquery::BigQueryConnection;
