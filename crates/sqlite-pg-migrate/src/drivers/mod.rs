//! Database driver implementations.
//!
//! This module provides database-specific implementations of the core traits:
//!
//! - [`sqlite`]: SQLite source reader, plus a SQLite target writer
//! - [`postgres`]: PostgreSQL target writer
//! - [`common`]: Shared utilities (TLS)
//!
//! # Architecture
//!
//! Each driver module implements:
//! - `Dialect`: SQL syntax strategy for the database engine
//! - `SourceReader` and/or `TargetWriter`
//!
//! The target descriptor picks the backend: `postgres://`, `postgresql://`
//! and libpq `key=value` strings select PostgreSQL, `sqlite:` URLs select
//! SQLite.

pub mod common;
pub mod postgres;
pub mod sqlite;

use std::path::Path;

// Re-export common utilities
pub use common::{SslMode, TlsBuilder};

// Re-export driver types
pub use postgres::{PostgresDialect, PostgresWriter};
pub use sqlite::{SqliteDialect, SqliteReader, SqliteWriter};

use crate::config::TargetConfig;
use crate::core::traits::TargetWriter;
use crate::error::{MigrateError, Result};

/// Target backend selected by a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Postgres,
    Sqlite,
}

impl TargetKind {
    /// Detect the backend from a target descriptor.
    pub fn detect(url: &str) -> Result<Self> {
        let url = url.trim();
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Ok(TargetKind::Postgres)
        } else if lower.starts_with("sqlite:") {
            Ok(TargetKind::Sqlite)
        } else if url.contains('=') && !url.contains("://") {
            Ok(TargetKind::Postgres)
        } else {
            Err(MigrateError::Config(format!(
                "Unsupported target descriptor '{}'. Expected postgres://, postgresql://, \
                 key=value or sqlite: form",
                crate::config::redact_url(url)
            )))
        }
    }
}

/// Open the source data file read-only.
pub async fn connect_source(path: &Path) -> Result<SqliteReader> {
    SqliteReader::open(path).await
}

/// Connect to the target described by `config`.
pub async fn connect_target(config: &TargetConfig) -> Result<Box<dyn TargetWriter>> {
    match TargetKind::detect(&config.url)? {
        TargetKind::Postgres => {
            let writer = PostgresWriter::connect(&config.url, config.ssl_mode.as_deref()).await?;
            Ok(Box::new(writer))
        }
        TargetKind::Sqlite => Ok(Box::new(SqliteWriter::connect(&config.url).await?)),
    }
}
