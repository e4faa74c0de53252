//! SQLite source reader implementation.
//!
//! Implements the `SourceReader` trait for reading whole tables from a
//! SQLite database file. Uses SQLx with a single read-only connection.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Row as _, TypeInfo, ValueRef};
use tracing::{debug, info};

use crate::core::traits::SourceReader;
use crate::core::value::{Row, SqlValue};
use crate::error::{MigrateError, Result};

/// SQLite source reader implementation.
pub struct SqliteReader {
    conn: Option<SqliteConnection>,
}

impl SqliteReader {
    /// Open the database file read-only.
    ///
    /// The file must already exist; it is never created.
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MigrateError::SourceNotFound(path.to_path_buf()));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let mut conn = options
            .connect()
            .await
            .map_err(|e| MigrateError::pool(e, "opening SQLite source"))?;

        // Test connection
        sqlx::query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(|e| MigrateError::pool(e, "testing SQLite source connection"))?;

        info!("Opened SQLite source: {}", path.display());

        Ok(Self { conn: Some(conn) })
    }

    fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| MigrateError::pool("connection closed", "using SQLite source"))
    }

    fn quote_ident(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Convert one SQLite row, sharing `columns` with the other rows.
fn convert_row(row: &SqliteRow, columns: &Arc<[String]>) -> Result<Row> {
    let values = (0..row.len())
        .map(|idx| value_at(row, idx))
        .collect::<Result<Vec<_>>>()?;
    Ok(Row::new(columns.clone(), values))
}

/// Read a cell by its storage class.
fn value_at(row: &SqliteRow, idx: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let class = raw.type_info().name().to_ascii_uppercase();

    let value = if class.contains("INT") || class == "BOOLEAN" {
        SqlValue::Integer(row.try_get_unchecked::<i64, _>(idx)?)
    } else if class == "REAL" || class.contains("FLOA") || class.contains("DOUB") {
        SqlValue::Real(row.try_get_unchecked::<f64, _>(idx)?)
    } else if class == "BLOB" {
        SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(idx)?)
    } else {
        SqlValue::Text(row.try_get_unchecked::<String, _>(idx)?)
    };
    Ok(value)
}

#[async_trait]
impl SourceReader for SqliteReader {
    async fn read_table(&mut self, table: &str) -> Result<Vec<Row>> {
        let sql = format!("SELECT * FROM {}", Self::quote_ident(table));
        let rows: Vec<SqliteRow> = sqlx::query(&sql).fetch_all(self.conn()?).await?;

        let Some(first) = rows.first() else {
            debug!("{}: no rows in source", table);
            return Ok(Vec::new());
        };

        let columns: Arc<[String]> = first
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let converted = rows
            .iter()
            .map(|row| convert_row(row, &columns))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "{}: read {} rows ({} columns)",
            table,
            converted.len(),
            columns.len()
        );
        Ok(converted)
    }

    async fn row_count(&mut self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", Self::quote_ident(table));
        let row = sqlx::query(&sql).fetch_one(self.conn()?).await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    fn db_type(&self) -> &str {
        "sqlite"
    }

    async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                debug!("Error closing SQLite source: {}", e);
            }
        }
    }
}
