//! Tabular results produced by queryers.

use crate::error::{GeoRewriteError, Result};
use crate::queryer::ColumnType;
use bytes::Bytes;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i32),
    Double(f64),
    Text(String),
    /// Variable-length binary, used for well-known-binary geometries.
    Binary(Bytes),
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Binary(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub length: u32,
    pub precision: u32,
}

/// An in-memory result set: column metadata plus rows of values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<ResultColumn>,
    rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        column_type: ColumnType,
        length: u32,
        precision: u32,
    ) {
        self.columns.push(ResultColumn {
            name: name.into(),
            column_type,
            length,
            precision,
        });
    }

    /// Appends a row; it must hold exactly one value per column.
    pub fn add_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(GeoRewriteError::RowArity {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[ResultColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_must_match_columns() {
        let mut rs = ResultSet::new();
        rs.add_column("fid", ColumnType::Integer, 10, 0);
        rs.add_column("NAME", ColumnType::Varchar, 50, 0);

        rs.add_row(vec![Value::Integer(1), "a".into()]).unwrap();
        let err = rs.add_row(vec![Value::Integer(2)]).unwrap_err();
        assert!(matches!(
            err,
            GeoRewriteError::RowArity {
                expected: 2,
                actual: 1
            }
        ));
        assert_eq!(rs.len(), 1);
    }

    #[test]
    fn test_column_values() {
        let mut rs = ResultSet::new();
        rs.add_column("VALUE", ColumnType::Double, 8, 4);
        rs.add_row(vec![Value::Double(0.5)]).unwrap();
        rs.add_row(vec![Value::Null]).unwrap();

        let values: Vec<_> = rs.column_values("VALUE").unwrap().cloned().collect();
        assert_eq!(values, vec![Value::Double(0.5), Value::Null]);
        assert!(rs.column_values("missing").is_none());
    }
}
