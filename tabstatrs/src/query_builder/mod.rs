use std::sync::Arc;

use crate::catalog::Catalog;
use crate::dialect::{BigQueryDialect, Dialect};
use crate::error::Result;
use crate::params::QueryParams;
use crate::request::QueryRequest;
use crate::table_path::TablePath;

mod filters;
mod grouping;
mod projection;
mod render;

pub use render::render_query;

/// Validates query parameters against one table's catalog and renders them
/// into a single SQL string.
///
/// The builder holds no per-build state; the catalog is shared read-only and
/// replaced wholesale (never mutated) when the table schema is refreshed.
#[derive(Clone)]
pub struct SqlBuilder {
    table: TablePath,
    catalog: Arc<Catalog>,
    dialect: Arc<dyn Dialect + Send + Sync>,
    max_row_limit: u64,
}

impl SqlBuilder {
    /// Builder for a BigQuery table.
    pub fn new(table: TablePath, catalog: Arc<Catalog>) -> Self {
        Self::with_dialect(table, catalog, Arc::new(BigQueryDialect))
    }

    pub fn with_dialect(
        table: TablePath,
        catalog: Arc<Catalog>,
        dialect: Arc<dyn Dialect + Send + Sync>,
    ) -> Self {
        Self {
            table,
            catalog,
            dialect,
            max_row_limit: 0,
        }
    }

    /// Reject requests whose limit exceeds `max_row_limit` (0 = no cap).
    pub fn with_max_row_limit(mut self, max_row_limit: u64) -> Self {
        self.max_row_limit = max_row_limit;
        self
    }

    pub fn table(&self) -> &TablePath {
        &self.table
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Validate parameters into a request model without rendering.
    pub fn validate(&self, params: &QueryParams) -> Result<QueryRequest> {
        QueryRequest::validate_capped(params, &self.catalog, self.max_row_limit)
    }

    /// Render an already validated request.
    pub fn render(&self, request: &QueryRequest) -> String {
        let sql = render_query(request, &self.table, self.dialect.as_ref());
        tracing::info!(table = %self.table, sql = %sql, "final query");
        sql
    }

    /// Validate and render in one step. No SQL is produced if any check fails.
    pub fn build(&self, params: &QueryParams) -> Result<String> {
        let request = self.validate(params)?;
        Ok(self.render(&request))
    }
}

impl std::fmt::Debug for SqlBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlBuilder")
            .field("table", &self.table)
            .field("columns", &self.catalog.len())
            .field("max_row_limit", &self.max_row_limit)
            .finish()
    }
}
