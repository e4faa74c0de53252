//! Row and value types for database-agnostic data transfer.
//!
//! Values mirror SQLite's storage classes. A [`Row`] is an ordered
//! column-to-value mapping as read from the source; a [`RowSet`] is a whole
//! table snapshot whose rows were checked to share one column list.

use std::fmt;
use std::sync::Arc;

use crate::error::{MigrateError, Result};

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,

    /// 64-bit signed integer.
    Integer(i64),

    /// 64-bit floating point.
    Real(f64),

    /// UTF-8 text.
    Text(String),

    /// Binary data.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Storage class name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Integer(_) => "integer",
            SqlValue::Real(_) => "real",
            SqlValue::Text(_) => "text",
            SqlValue::Blob(_) => "blob",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Integer(v) => write!(f, "{}", v),
            SqlValue::Real(v) => write!(f, "{}", v),
            SqlValue::Text(s) => write!(f, "{}", s),
            SqlValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// One source row: values in column order.
///
/// The column list is shared between rows read by the same statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Build a row. `columns` and `values` must have the same length.
    pub fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        let (columns, values): (Vec<String>, Vec<SqlValue>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in column order.
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Value of the named column.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn has_columns(&self, columns: &Arc<[String]>) -> bool {
        Arc::ptr_eq(&self.columns, columns) || self.columns[..] == columns[..]
    }
}

/// A table snapshot whose rows all share one column list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

impl RowSet {
    /// Validate that every row has the columns of the first row, in the
    /// same order, and split the rows into a column list and value vectors.
    ///
    /// An empty input yields an empty set with no columns.
    pub fn from_rows(table: &str, rows: Vec<Row>) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Ok(Self::default());
        };
        let expected = first.columns.clone();

        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| !row.has_columns(&expected))
        {
            return Err(MigrateError::NonUniformRows {
                table: table.to_string(),
                row: idx,
                expected: expected.join(", "),
                found: row.columns.join(", "),
            });
        }

        Ok(Self {
            columns: expected.to_vec(),
            rows: rows.into_iter().map(|r| r.values).collect(),
        })
    }

    /// Column names in order. Empty when the table had no rows.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row values in column order.
    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the named column was observed.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Split the rows into consecutive batches of at most `batch_size` rows.
    pub fn batches(&self, batch_size: usize) -> impl Iterator<Item = Batch<'_>> {
        self.rows
            .chunks(batch_size.max(1))
            .map(|rows| Batch { rows })
    }
}

/// A contiguous, non-empty run of rows sent in one bulk insert.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    rows: &'a [Vec<SqlValue>],
}

impl<'a> Batch<'a> {
    /// Rows in this batch.
    pub fn rows(&self) -> &'a [Vec<SqlValue>] {
        self.rows
    }

    /// Number of rows in the batch.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
