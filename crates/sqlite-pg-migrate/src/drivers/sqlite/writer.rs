//! SQLite target writer implementation.
//!
//! Writes into an existing SQLite database over a single connection. The
//! schema must already be in place, as with the PostgreSQL target.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection, Row};
use tracing::{debug, info};

use super::SqliteDialect;
use crate::core::traits::{Dialect, TargetWriter};
use crate::core::value::SqlValue;
use crate::error::{MigrateError, Result};

/// SQLite target writer implementation.
pub struct SqliteWriter {
    conn: Option<SqliteConnection>,
    dialect: SqliteDialect,
}

impl SqliteWriter {
    /// Connect using a `sqlite:` URL. The database file must exist.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| MigrateError::Config(format!("Invalid target descriptor: {}", e)))?
            .create_if_missing(false)
            .foreign_keys(true);

        let mut conn = options
            .connect()
            .await
            .map_err(|e| MigrateError::pool(e, "connecting to SQLite target"))?;

        let row = sqlx::query(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence'",
        )
        .fetch_one(&mut conn)
        .await
        .map_err(MigrateError::SqliteTarget)?;
        let has_sequence_table = row
            .try_get::<i64, _>(0)
            .map_err(MigrateError::SqliteTarget)?
            > 0;

        info!("Connected to SQLite target: {}", url);
        debug!("sqlite_sequence present: {}", has_sequence_table);

        Ok(Self {
            conn: Some(conn),
            dialect: SqliteDialect::new().with_sequence_table(has_sequence_table),
        })
    }

    fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| MigrateError::pool("connection closed", "using SQLite target"))
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<i64>),
        SqlValue::Integer(v) => query.bind(*v),
        SqlValue::Real(v) => query.bind(*v),
        SqlValue::Text(s) => query.bind(s.as_str()),
        SqlValue::Blob(b) => query.bind(b.as_slice()),
    }
}

#[async_trait]
impl TargetWriter for SqliteWriter {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let query = params
            .iter()
            .fold(sqlx::query(sql), |query, value| bind_value(query, value));

        let result = query
            .execute(self.conn()?)
            .await
            .map_err(MigrateError::SqliteTarget)?;
        Ok(result.rows_affected())
    }

    async fn query_i64(&mut self, sql: &str) -> Result<Option<i64>> {
        let row = sqlx::query(sql)
            .fetch_one(self.conn()?)
            .await
            .map_err(MigrateError::SqliteTarget)?;
        row.try_get_unchecked::<Option<i64>, _>(0)
            .map_err(MigrateError::SqliteTarget)
    }

    fn db_type(&self) -> &str {
        "sqlite"
    }

    async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                debug!("Error closing SQLite target: {}", e);
            }
        }
    }
}
