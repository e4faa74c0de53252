//! # sqlite-pg-migrate
//!
//! One-shot bulk migration of a SQLite data file into an existing
//! PostgreSQL schema.
//!
//! A run empties every listed target table, then copies each table in
//! dependency order, one transaction per table:
//!
//! - **Batched inserts** as multi-row INSERT statements
//! - **Key generator resync** so new rows continue after the copied keys
//! - **Progress updates** over a `tokio::sync::mpsc` channel
//! - **Row-count validation** and connectivity checks
//!
//! A `sqlite:` target descriptor selects a SQLite target instead, which is
//! what the end-to-end tests run against.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqlite_pg_migrate::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> sqlite_pg_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config)?;
//!     let report = orchestrator.run().await?;
//!     println!("Migrated {} rows", report.total_rows);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod orchestrator;
pub mod sequence;
pub mod transfer;

#[cfg(test)]
mod test_support;

// Re-exports for convenient access
pub use crate::config::{BatchSize, Config, MigrationConfig, SourceConfig, TableSpec, TargetConfig};
pub use crate::core::{Row, RowSet, SqlValue, Statement};
pub use crate::error::{ErrorKind, MigrateError, MigrationPhase, Result};
pub use crate::orchestrator::{
    HealthCheckResult, MigrationReport, Orchestrator, TableReport, TableValidation,
};
pub use crate::sequence::{next_value_after, SequenceState};
pub use crate::transfer::{BatchLoader, ProgressUpdate};
