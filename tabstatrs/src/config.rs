//! Configuration for tabstat.
//!
//! TOML-based configuration with global defaults, BigQuery connection options
//! and named table bindings.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TabstatError};
use crate::params::QueryParams;
use crate::table_path::TablePath;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TabstatConfig {
    /// Global defaults applied to every session.
    pub defaults: GlobalDefaults,

    /// BigQuery connection options.
    pub bigquery: BigQueryConfig,

    /// Named table bindings (keyed by alias).
    pub tables: BTreeMap<String, TableConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalDefaults {
    pub query: QueryConfig,
    pub schema_cache: SchemaCacheConfig,
}

/// Query execution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Query timeout in milliseconds (default: 30000).
    pub timeout_ms: u64,
    /// Largest accepted `limit` (0 = unlimited).
    pub max_row_limit: u64,
}

/// Schema cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaCacheConfig {
    /// Cache TTL in seconds (default: 3600).
    pub ttl_secs: u64,
    /// Maximum cached schemas (default: 1000).
    pub max_size: usize,
}

/// BigQuery-specific configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BigQueryConfig {
    /// Service account key file. Application default credentials when unset.
    pub credentials_path: Option<PathBuf>,
    /// Enable query cache (default: true).
    pub use_query_cache: bool,
    /// Maximum bytes billed per query (0 = unlimited).
    pub maximum_bytes_billed: i64,
    /// Maximum concurrent queries to BigQuery (default: 30).
    pub max_concurrent_queries: usize,
    /// Maximum time (ms) to wait for a query slot (default: 1500, 0 = wait forever).
    pub queue_timeout_ms: u64,
}

/// A named table binding, optionally with a stored query.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TableConfig {
    /// `project.dataset.table`
    pub path: String,
    /// Stored request for this table, in the same shape as a JSON params document.
    pub query: Option<toml::Value>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_row_limit: 0,
        }
    }
}

impl Default for SchemaCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            max_size: 1000,
        }
    }
}

impl Default for BigQueryConfig {
    fn default() -> Self {
        Self {
            credentials_path: None,
            use_query_cache: true,
            maximum_bytes_billed: 0,
            max_concurrent_queries: 30,
            queue_timeout_ms: 1_500,
        }
    }
}

impl TableConfig {
    pub fn table_path(&self) -> Result<TablePath> {
        TablePath::parse(&self.path)
    }

    /// Decode the stored query, if any.
    pub fn params(&self) -> Result<Option<QueryParams>> {
        let Some(query) = &self.query else {
            return Ok(None);
        };
        let value = serde_json::to_value(query)?;
        QueryParams::from_json(&value).map(Some)
    }
}

impl TabstatConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| TabstatError::Config(format!("failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| TabstatError::Config(format!("failed to parse config: {e}")))
    }

    /// Load from default locations (env var, cwd, user config dir, or defaults).
    ///
    /// Search order:
    /// 1. `TABSTAT_CONFIG` environment variable
    /// 2. `./tabstat.toml` (current directory)
    /// 3. `~/.config/tabstat/config.toml` (user config dir)
    /// 4. Built-in defaults
    pub fn load_default() -> Self {
        if let Ok(path) = std::env::var("TABSTAT_CONFIG") {
            match Self::from_file(&path) {
                Ok(cfg) => {
                    tracing::info!(path = %path, "loaded config from TABSTAT_CONFIG");
                    return cfg;
                }
                Err(err) => tracing::warn!(path = %path, error = %err, "ignoring TABSTAT_CONFIG"),
            }
        }

        if let Ok(cfg) = Self::from_file("tabstat.toml") {
            tracing::info!("loaded config from ./tabstat.toml");
            return cfg;
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tabstat").join("config.toml");
            if let Ok(cfg) = Self::from_file(&user_config) {
                tracing::info!(path = %user_config.display(), "loaded config from user config dir");
                return cfg;
            }
        }

        tracing::debug!("no config file found, using defaults");
        Self::default()
    }

    /// Look up a named table binding.
    pub fn table(&self, alias: &str) -> Result<&TableConfig> {
        self.tables
            .get(alias)
            .ok_or_else(|| TabstatError::Config(format!("no table named {alias} in config")))
    }
}
