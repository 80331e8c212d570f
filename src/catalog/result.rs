//! Query result types.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::catalog::error::CatalogResult;

/// One solution row: variable name to bound value.
pub type Row = BTreeMap<String, Value>;

/// Variable bindings passed along with a query.
pub type Bindings = BTreeMap<String, String>;

/// A lazily produced sequence of rows from a remote query.
///
/// Rows are pulled from the underlying source on iteration; each row may fail
/// independently (e.g. the connection drops mid-stream).
pub struct ResultSet {
    columns: Vec<String>,
    rows: Box<dyn Iterator<Item = CatalogResult<Row>> + Send>,
}

impl ResultSet {
    /// Wrap a row source.
    pub fn new<I>(columns: Vec<String>, rows: I) -> Self
    where
        I: Iterator<Item = CatalogResult<Row>> + Send + 'static,
    {
        Self {
            columns,
            rows: Box::new(rows),
        }
    }

    /// Create from already materialized rows.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self::new(columns, rows.into_iter().map(Ok))
    }

    /// A result with no columns and no rows.
    pub fn empty() -> Self {
        Self::from_rows(Vec::new(), Vec::new())
    }

    /// Column (variable) names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Drain the remaining rows, stopping at the first failure.
    pub fn collect_rows(self) -> CatalogResult<Vec<Row>> {
        self.rows.collect()
    }
}

impl Iterator for ResultSet {
    type Item = CatalogResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }
}

impl fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSet")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::error::CatalogError;

    fn row(name: &str) -> Row {
        let mut row = Row::new();
        row.insert("name".to_string(), Value::String(name.to_string()));
        row
    }

    #[test]
    fn test_from_rows() {
        let rs = ResultSet::from_rows(vec!["name".into()], vec![row("Alice"), row("Bob")]);
        assert_eq!(rs.columns().to_vec(), vec!["name".to_string()]);
        let rows = rs.collect_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("name"), Some(&Value::String("Bob".into())));
    }

    #[test]
    fn test_lazy_failure_surfaces_on_iteration() {
        let source = vec![
            Ok(row("Alice")),
            Err(CatalogError::Connectivity("stream reset".into())),
        ];
        let mut rs = ResultSet::new(vec!["name".into()], source.into_iter());
        assert!(rs.next().unwrap().is_ok());
        assert!(rs.next().unwrap().is_err());
        assert!(rs.next().is_none());
    }

    #[test]
    fn test_empty() {
        assert!(ResultSet::empty().collect_rows().unwrap().is_empty());
    }
}
