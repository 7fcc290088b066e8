//! Validated SQL query builder for single-table BigQuery analytics.
//!
//! Callers describe a request as dimensions, metrics, one aggregation,
//! filters, a sort and a limit. Every identifier is checked against the bound
//! table's column catalog and every keyword against a closed registry before a
//! single `SELECT` statement is rendered.

pub mod aggregation;
pub mod backends;
pub mod catalog;
pub mod config;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod logging;
pub mod operand;
pub mod params;
pub mod plot;
pub mod query_builder;
pub mod request;
pub mod schema_cache;
pub mod session;
pub mod table_path;

pub use aggregation::{Aggregation, AggregationKind};
pub use backends::Warehouse;
pub use catalog::{Catalog, ColumnType};
pub use config::TabstatConfig;
pub use error::{Result, TabstatError};
pub use executor::{ColumnMeta, QueryResult};
pub use operand::Operand;
pub use params::{FilterValue, QueryParams, Scalar};
pub use plot::{PlotAxes, PlotKind, PlotPoint};
pub use query_builder::SqlBuilder;
pub use request::{QueryRequest, SortDirection};
pub use schema_cache::{ColumnSchema, SchemaCache, TableSchema};
pub use session::{PreparedQuery, SharedSchemaCache, TableSession};
pub use table_path::TablePath;
