//! A warehouse table bound for querying.
//!
//! Binding checks the table exists and loads its catalog once; every request
//! afterwards is validated and rendered locally, and only the final SQL goes
//! back to the warehouse.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::backends::Warehouse;
use crate::catalog::Catalog;
use crate::config::QueryConfig;
use crate::error::{Result, TabstatError};
use crate::executor::QueryResult;
use crate::params::QueryParams;
use crate::query_builder::SqlBuilder;
use crate::request::QueryRequest;
use crate::schema_cache::SchemaCache;
use crate::table_path::TablePath;

/// Schema cache shared between sessions.
pub type SharedSchemaCache = Arc<Mutex<SchemaCache>>;

/// A validated request together with the SQL it renders to.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub request: QueryRequest,
    pub sql: String,
}

pub struct TableSession {
    warehouse: Arc<dyn Warehouse>,
    cache: SharedSchemaCache,
    builder: SqlBuilder,
    config: QueryConfig,
}

impl TableSession {
    pub async fn bind(
        warehouse: Arc<dyn Warehouse>,
        table: TablePath,
        cache: SharedSchemaCache,
    ) -> Result<Self> {
        Self::bind_with_config(warehouse, table, cache, QueryConfig::default()).await
    }

    pub async fn bind_with_config(
        warehouse: Arc<dyn Warehouse>,
        table: TablePath,
        cache: SharedSchemaCache,
        config: QueryConfig,
    ) -> Result<Self> {
        if !warehouse.table_exists(&table).await? {
            return Err(TabstatError::TableNotFound(table.to_string()));
        }
        let catalog = load_catalog(warehouse.as_ref(), &cache, &table).await?;
        tracing::info!(table = %table, columns = catalog.len(), "bound table");

        let builder = SqlBuilder::with_dialect(table, catalog, warehouse.dialect())
            .with_max_row_limit(config.max_row_limit);
        Ok(Self {
            warehouse,
            cache,
            builder,
            config,
        })
    }

    pub fn table(&self) -> &TablePath {
        self.builder.table()
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        self.builder.catalog()
    }

    /// Validate and render without touching the warehouse.
    pub fn prepare(&self, params: &QueryParams) -> Result<PreparedQuery> {
        let request = self.builder.validate(params)?;
        let sql = self.builder.render(&request);
        Ok(PreparedQuery { request, sql })
    }

    /// Execute a prepared query under the configured timeout (0 = none).
    pub async fn run(&self, prepared: &PreparedQuery) -> Result<QueryResult> {
        let start = Instant::now();
        let execution = self.warehouse.execute_sql(&prepared.sql);
        let result = if self.config.timeout_ms == 0 {
            execution.await?
        } else {
            tokio::time::timeout(Duration::from_millis(self.config.timeout_ms), execution)
                .await
                .map_err(|_| {
                    tracing::warn!(
                        table = %self.table(),
                        timeout_ms = self.config.timeout_ms,
                        "query timed out"
                    );
                    TabstatError::Timeout(self.config.timeout_ms)
                })??
        };
        tracing::debug!(
            table = %self.table(),
            rows = result.len(),
            ms = start.elapsed().as_millis(),
            "query finished"
        );
        Ok(result)
    }

    pub async fn query(&self, params: &QueryParams) -> Result<QueryResult> {
        let prepared = self.prepare(params)?;
        self.run(&prepared).await
    }

    /// Re-fetch the table schema. Requests prepared earlier keep the catalog
    /// they were validated against.
    pub async fn refresh(&mut self) -> Result<()> {
        let table = self.table().clone();
        self.cache.lock().await.invalidate(&table);
        let catalog = load_catalog(self.warehouse.as_ref(), &self.cache, &table).await?;
        tracing::info!(table = %table, columns = catalog.len(), "refreshed catalog");
        self.builder = SqlBuilder::with_dialect(table, catalog, self.warehouse.dialect())
            .with_max_row_limit(self.config.max_row_limit);
        Ok(())
    }
}

async fn load_catalog(
    warehouse: &dyn Warehouse,
    cache: &SharedSchemaCache,
    table: &TablePath,
) -> Result<Arc<Catalog>> {
    {
        let mut cache = cache.lock().await;
        cache.evict_expired();
        if let Some(catalog) = cache.get(table) {
            tracing::debug!(table = %table, "catalog cache hit");
            return Ok(catalog);
        }
    }

    let schema = warehouse.fetch_schema(table).await?;
    if schema.columns.is_empty() {
        return Err(TabstatError::Schema(format!("table {table} has no columns")));
    }
    let catalog = Arc::new(Catalog::from_schema(&schema));
    cache.lock().await.insert(table.clone(), Arc::clone(&catalog));
    Ok(catalog)
}
