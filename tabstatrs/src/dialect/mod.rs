//! SQL dialect abstractions.
//!
//! The query builder decides clause structure; a dialect only maps the
//! lexical pieces that differ between warehouses: how the target table is
//! written, how column names are quoted and how a string literal is escaped.

use crate::table_path::TablePath;

pub trait Dialect {
    /// Render the `FROM` target for a fully-qualified table.
    fn qualify_table(&self, path: &TablePath) -> String;

    /// Render a column name or alias. Plain names come back unchanged.
    fn quote_ident(&self, ident: &str) -> String {
        if is_plain_ident(ident) {
            ident.to_string()
        } else {
            format!("\"{}\"", ident.replace('"', "\"\""))
        }
    }

    /// Render `value` as a single-quoted string literal that cannot be
    /// terminated early by its contents.
    fn quote_string(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_plain_ident(ident: &str) -> bool {
    let mut chars = ident.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

mod bigquery;
pub use bigquery::BigQueryDialect;
