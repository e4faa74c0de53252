//! PostgreSQL target writer implementation.
//!
//! Implements the `TargetWriter` trait for PostgreSQL. The pool is capped at
//! one connection and that connection is held for the writer's lifetime, so
//! `BEGIN`/`COMMIT` issued as plain statements scope every statement between
//! them.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Config as PgConfig, Row};
use tracing::{debug, info, warn};

use super::PostgresDialect;
use crate::config::redact_url;
use crate::core::traits::{Dialect, TargetWriter};
use crate::core::value::SqlValue;
use crate::drivers::common::{SslMode, TlsBuilder};
use crate::error::{MigrateError, Result};

/// Connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// PostgreSQL target writer implementation.
pub struct PostgresWriter {
    pool: Pool,
    client: Option<Object>,
    dialect: PostgresDialect,
}

impl PostgresWriter {
    /// Connect using a `postgres://` URL or a `key=value` descriptor.
    ///
    /// `ssl_mode` overrides any `sslmode` given in the descriptor.
    pub async fn connect(url: &str, ssl_mode: Option<&str>) -> Result<Self> {
        let mut pg_config = PgConfig::from_str(url).map_err(|e| {
            MigrateError::Config(format!("Invalid target descriptor: {}", e))
        })?;

        let mode = match ssl_mode {
            Some(mode) => SslMode::parse(mode)?,
            None => SslMode::from_pg(pg_config.get_ssl_mode()),
        };
        pg_config.ssl_mode(mode.to_pg());

        // Connection options for reliability
        pg_config.keepalives(true);
        pg_config.keepalives_idle(Duration::from_secs(30));
        pg_config.connect_timeout(CONNECT_TIMEOUT);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let pool = match TlsBuilder::new(mode).build()? {
            None => {
                warn!("PostgreSQL TLS is disabled. Credentials will be transmitted in plaintext.");
                let mgr = Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config);
                Pool::builder(mgr).max_size(1).build()
            }
            Some(tls_connector) => {
                let mgr = Manager::from_config(pg_config, tls_connector, mgr_config);
                Pool::builder(mgr).max_size(1).build()
            }
        }
        .map_err(|e| MigrateError::pool(e, "creating PostgreSQL target pool"))?;

        let client = pool
            .get()
            .await
            .map_err(|e| MigrateError::pool(e, "connecting to PostgreSQL target"))?;

        // Test connection
        client.simple_query("SELECT 1").await?;

        info!("Connected to PostgreSQL target: {}", redact_url(url));

        Ok(Self {
            pool,
            client: Some(client),
            dialect: PostgresDialect::new(),
        })
    }

    fn client(&self) -> Result<&Object> {
        self.client
            .as_ref()
            .ok_or_else(|| MigrateError::pool("connection closed", "using PostgreSQL target"))
    }
}

#[async_trait]
impl TargetWriter for PostgresWriter {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let client = self.client()?;

        if params.is_empty() {
            // Simple protocol, no prepare round trip
            client.batch_execute(sql).await?;
            return Ok(0);
        }

        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
        let affected = client.execute(sql, &refs).await?;
        debug!("{} rows affected", affected);
        Ok(affected)
    }

    async fn query_i64(&mut self, sql: &str) -> Result<Option<i64>> {
        let client = self.client()?;
        let row = client.query_one(sql, &[]).await?;
        read_i64(&row)
    }

    fn db_type(&self) -> &str {
        "postgres"
    }

    async fn close(&mut self) {
        // Return the connection before closing the pool
        self.client.take();
        self.pool.close();
    }
}

/// Integer width of a result column that widens losslessly into `i64`.
fn integer_width(ty: &Type) -> Option<u8> {
    if *ty == Type::INT2 {
        Some(2)
    } else if *ty == Type::INT4 {
        Some(4)
    } else if *ty == Type::INT8 {
        Some(8)
    } else {
        None
    }
}

/// Read column 0 as a nullable `i64`, widening `int2`/`int4` results.
fn read_i64(row: &Row) -> Result<Option<i64>> {
    let width = row.columns().first().and_then(|c| integer_width(c.type_()));
    Ok(match width {
        Some(2) => row.try_get::<_, Option<i16>>(0)?.map(i64::from),
        Some(4) => row.try_get::<_, Option<i32>>(0)?.map(i64::from),
        _ => row.try_get::<_, Option<i64>>(0)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_width() {
        assert_eq!(integer_width(&Type::INT2), Some(2));
        assert_eq!(integer_width(&Type::INT4), Some(4));
        assert_eq!(integer_width(&Type::INT8), Some(8));
        assert_eq!(integer_width(&Type::NUMERIC), None);
        assert_eq!(integer_width(&Type::TEXT), None);
    }
}
