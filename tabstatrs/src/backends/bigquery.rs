//! BigQuery warehouse using gcp-bigquery-client.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gcp_bigquery_client::model::query_request::QueryRequest;
use gcp_bigquery_client::model::query_response::ResultSet;
use gcp_bigquery_client::Client;
use tokio::sync::Semaphore;

use crate::config::BigQueryConfig;
use crate::dialect::{BigQueryDialect, Dialect};
use crate::error::{Result, TabstatError};
use crate::executor::{ColumnMeta, QueryResult};
use crate::schema_cache::{ColumnSchema, TableSchema};
use crate::table_path::TablePath;

use super::Warehouse;

pub struct BigQueryConnection {
    client: Client,
    /// Project billed for query jobs.
    project_id: String,
    dialect: Arc<dyn Dialect + Send + Sync>,
    config: BigQueryConfig,
    /// Limits concurrent BigQuery queries for backpressure.
    limiter: Arc<Semaphore>,
}

impl BigQueryConnection {
    /// Connect using `config.credentials_path` when set, application default
    /// credentials otherwise.
    pub async fn connect(project_id: &str, config: BigQueryConfig) -> Result<Self> {
        let client = match &config.credentials_path {
            Some(path) => {
                let path = validate_credentials_path(path)?;
                tracing::info!(
                    project_id = %project_id,
                    credentials = %path,
                    use_query_cache = config.use_query_cache,
                    maximum_bytes_billed = config.maximum_bytes_billed,
                    "creating BigQuery connection from service account"
                );
                Client::from_service_account_key_file(&path).await
            }
            None => {
                tracing::info!(
                    project_id = %project_id,
                    use_query_cache = config.use_query_cache,
                    maximum_bytes_billed = config.maximum_bytes_billed,
                    "creating BigQuery connection from application default credentials"
                );
                Client::from_application_default_credentials().await
            }
        }
        .map_err(|e| {
            tracing::error!(error = %e, "failed to create BigQuery client");
            TabstatError::Execution(format!("create bigquery client: {e}"))
        })?;

        tracing::info!(
            project_id = %project_id,
            max_concurrent = config.max_concurrent_queries,
            "BigQuery connection established"
        );

        Ok(Self {
            client,
            project_id: project_id.to_string(),
            dialect: Arc::new(BigQueryDialect),
            limiter: Arc::new(Semaphore::new(config.max_concurrent_queries.max(1))),
            config,
        })
    }

    pub fn config(&self) -> &BigQueryConfig {
        &self.config
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Acquire a query slot, waiting at most `queue_timeout_ms` (0 = forever).
    async fn acquire_slot(&self) -> Result<tokio::sync::OwnedSemaphorePermit> {
        if self.limiter.available_permits() == 0 {
            tracing::debug!(
                max_concurrent = self.config.max_concurrent_queries,
                queue_timeout_ms = self.config.queue_timeout_ms,
                "BigQuery slots exhausted, waiting for permit"
            );
        }

        let timeout_ms = self.config.queue_timeout_ms;
        if timeout_ms == 0 {
            return self
                .limiter
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| TabstatError::Execution(format!("limiter closed: {e}")));
        }

        let timeout = Duration::from_millis(timeout_ms);
        match tokio::time::timeout(timeout, self.limiter.clone().acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(e)) => Err(TabstatError::Execution(format!("limiter closed: {e}"))),
            Err(_) => {
                tracing::warn!(
                    max_concurrent = self.config.max_concurrent_queries,
                    timeout_ms = timeout_ms,
                    "BigQuery request rejected: queue timeout exceeded"
                );
                Err(TabstatError::Execution(format!(
                    "BigQuery overloaded: request queued for {}ms, max concurrent queries ({}) reached",
                    timeout_ms, self.config.max_concurrent_queries
                )))
            }
        }
    }
}

/// A key file must exist and be a `.json` document.
fn validate_credentials_path(path: &Path) -> Result<String> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(TabstatError::Config(format!(
            "credentials file {} must be a .json key file",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(TabstatError::Config(format!(
            "credentials file {} does not exist",
            path.display()
        )));
    }
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| TabstatError::Config(format!("credentials path {} is not UTF-8", path.display())))
}

fn is_not_found(message: &str) -> bool {
    message.contains("404") || message.contains("Not found") || message.contains("notFound")
}

#[async_trait]
impl Warehouse for BigQueryConnection {
    fn dialect(&self) -> Arc<dyn Dialect + Send + Sync> {
        Arc::clone(&self.dialect)
    }

    async fn table_exists(&self, table: &TablePath) -> Result<bool> {
        match self
            .client
            .table()
            .get(table.project(), table.dataset(), table.table(), None)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e.to_string()) => {
                tracing::debug!(table = %table, "BigQuery table not found");
                Ok(false)
            }
            Err(e) => {
                tracing::error!(error = %e, table = %table, "failed to look up BigQuery table");
                Err(TabstatError::Execution(format!("lookup bigquery table: {e}")))
            }
        }
    }

    async fn fetch_schema(&self, table: &TablePath) -> Result<TableSchema> {
        let start = Instant::now();
        tracing::debug!(table = %table, "fetching BigQuery table schema");

        let table_info = self
            .client
            .table()
            .get(table.project(), table.dataset(), table.table(), None)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, table = %table, "failed to get BigQuery table info");
                if is_not_found(&e.to_string()) {
                    TabstatError::TableNotFound(table.to_string())
                } else {
                    TabstatError::Schema(format!("fetch bigquery table {table}: {e}"))
                }
            })?;

        let columns: Vec<ColumnSchema> = table_info
            .schema
            .fields
            .iter()
            .flatten()
            .map(|field| ColumnSchema {
                name: field.name.clone(),
                data_type: format!("{:?}", field.r#type).to_uppercase(),
                nullable: field.mode.as_ref().is_none_or(|m| m != "REQUIRED"),
            })
            .collect();

        tracing::debug!(
            table = %table,
            columns = columns.len(),
            ms = start.elapsed().as_millis(),
            "bigquery fetch_schema"
        );

        Ok(TableSchema { columns })
    }

    /// Uses `query()` so schema and rows come from the same response.
    async fn execute_sql(&self, sql: &str) -> Result<QueryResult> {
        let _permit = self.acquire_slot().await?;

        let start = Instant::now();
        tracing::debug!(
            project = %self.project_id,
            sql_len = sql.len(),
            use_query_cache = self.config.use_query_cache,
            "executing BigQuery query"
        );
        tracing::trace!(sql = %sql, "BigQuery SQL");

        let mut query_request = QueryRequest::new(sql);
        query_request.use_query_cache = Some(self.config.use_query_cache);
        if self.config.maximum_bytes_billed > 0 {
            query_request.maximum_bytes_billed = Some(self.config.maximum_bytes_billed.to_string());
        }

        let response = self
            .client
            .job()
            .query(&self.project_id, query_request)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "BigQuery query execution failed");
                TabstatError::Execution(format!("bigquery query: {e}"))
            })?;

        // Schema order, not column_names(): that comes from a HashMap.
        let col_names: Vec<String> = response
            .schema
            .as_ref()
            .and_then(|s| s.fields.as_ref())
            .map(|fields| fields.iter().map(|f| f.name.clone()).collect())
            .unwrap_or_default();

        let mut rs = ResultSet::new_from_query_response(response);
        let mut rows = Vec::new();
        while rs.next_row() {
            let mut map = serde_json::Map::new();
            for col_name in &col_names {
                let value = rs
                    .get_json_value_by_name(col_name)
                    .ok()
                    .flatten()
                    .unwrap_or(serde_json::Value::Null);
                map.insert(col_name.clone(), value);
            }
            rows.push(map);
        }

        let columns: Vec<ColumnMeta> = col_names
            .into_iter()
            .map(|name| ColumnMeta { name })
            .collect();

        tracing::debug!(
            rows = rows.len(),
            columns = columns.len(),
            ms = start.elapsed().as_millis(),
            "bigquery execute_sql"
        );

        Ok(QueryResult { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn credentials_must_be_an_existing_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("sa.json");
        std::fs::File::create(&key)
            .unwrap()
            .write_all(b"{}")
            .unwrap();
        assert!(validate_credentials_path(&key).is_ok());

        let missing = dir.path().join("other.json");
        assert!(matches!(
            validate_credentials_path(&missing),
            Err(TabstatError::Config(_))
        ));

        let wrong_ext = dir.path().join("sa.txt");
        std::fs::File::create(&wrong_ext).unwrap();
        assert!(matches!(
            validate_credentials_path(&wrong_ext),
            Err(TabstatError::Config(_))
        ));
    }

    #[test]
    fn recognises_not_found_errors() {
        assert!(is_not_found("Response error (error: Not found: Table p:d.t)"));
        assert!(!is_not_found("permission denied"));
    }
}
