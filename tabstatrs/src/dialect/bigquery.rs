//! BigQuery dialect implementation.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::table_path::TablePath;

use super::{is_plain_ident, Dialect};

/// Reserved keywords of GoogleSQL. A column may carry one of these names,
/// but it has to be backtick-quoted wherever it is referenced.
static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "ALL", "AND", "ANY", "ARRAY", "AS", "ASC", "ASSERT_ROWS_MODIFIED", "AT", "BETWEEN",
        "BY", "CASE", "CAST", "COLLATE", "CONTAINS", "CREATE", "CROSS", "CUBE", "CURRENT",
        "DEFAULT", "DEFINE", "DESC", "DISTINCT", "ELSE", "END", "ENUM", "ESCAPE", "EXCEPT",
        "EXCLUDE", "EXISTS", "EXTRACT", "FALSE", "FETCH", "FOLLOWING", "FOR", "FROM", "FULL",
        "GROUP", "GROUPING", "GROUPS", "HASH", "HAVING", "IF", "IGNORE", "IN", "INNER",
        "INTERSECT", "INTERVAL", "INTO", "IS", "JOIN", "LATERAL", "LEFT", "LIKE", "LIMIT",
        "LOOKUP", "MERGE", "NATURAL", "NEW", "NO", "NOT", "NULL", "NULLS", "OF", "ON", "OR",
        "ORDER", "OUTER", "OVER", "PARTITION", "PRECEDING", "PROTO", "QUALIFY", "RANGE",
        "RECURSIVE", "RESPECT", "RIGHT", "ROLLUP", "ROWS", "SELECT", "SET", "SOME", "STRUCT",
        "TABLESAMPLE", "THEN", "TO", "TREAT", "TRUE", "UNBOUNDED", "UNION", "UNNEST", "USING",
        "WHEN", "WHERE", "WINDOW", "WITH", "WITHIN",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Default, Clone, Copy)]
pub struct BigQueryDialect;

impl Dialect for BigQueryDialect {
    fn qualify_table(&self, path: &TablePath) -> String {
        // Path parts are restricted to [A-Za-z0-9_-], so one pair of
        // backticks around the whole path is enough.
        path.quoted()
    }

    fn quote_ident(&self, ident: &str) -> String {
        if is_plain_ident(ident) && !RESERVED.contains(ident.to_ascii_uppercase().as_str()) {
            ident.to_string()
        } else {
            format!("`{}`", ident.replace('\\', "\\\\").replace('`', "\\`"))
        }
    }

    fn quote_string(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for c in value.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\'' => out.push_str("\\'"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                _ => out.push(c),
            }
        }
        out.push('\'');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_table_with_backticks() {
        let path = TablePath::parse("proj.data.tbl").unwrap();
        assert_eq!(BigQueryDialect.qualify_table(&path), "`proj.data.tbl`");
    }

    #[test]
    fn quotes_only_reserved_or_irregular_identifiers() {
        let d = BigQueryDialect;
        assert_eq!(d.quote_ident("team_abbreviation"), "team_abbreviation");
        assert_eq!(d.quote_ident("_pts2"), "_pts2");
        assert_eq!(d.quote_ident("order"), "`order`");
        assert_eq!(d.quote_ident("Group"), "`Group`");
        assert_eq!(d.quote_ident("2pt_pct"), "`2pt_pct`");
        assert_eq!(d.quote_ident("plus-minus"), "`plus-minus`");
        assert_eq!(d.quote_ident("a`b"), "`a\\`b`");
    }

    #[test]
    fn default_identifier_quoting_is_ansi() {
        struct Ansi;
        impl Dialect for Ansi {
            fn qualify_table(&self, path: &TablePath) -> String {
                path.to_string()
            }
        }
        assert_eq!(Ansi.quote_ident("pts"), "pts");
        assert_eq!(Ansi.quote_ident("plus minus"), "\"plus minus\"");
        assert_eq!(Ansi.quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn escapes_string_literals() {
        let d = BigQueryDialect;
        assert_eq!(d.quote_string("DEN"), "'DEN'");
        assert_eq!(d.quote_string("O'Neal"), "'O\\'Neal'");
        assert_eq!(d.quote_string("a\\' OR 1=1 --"), "'a\\\\\\' OR 1=1 --'");
        assert_eq!(d.quote_string("line\nbreak"), "'line\\nbreak'");
    }
}
