//! PostgreSQL driver.
//!
//! This module provides PostgreSQL-specific implementations:
//!
//! - [`PostgresDialect`]: SQL syntax strategy for PostgreSQL
//! - [`PostgresWriter`]: Target writer for PostgreSQL databases
//!
//! Parameter encoding for source values lives in `encode`.

mod dialect;
mod encode;
mod writer;

pub use dialect::PostgresDialect;
pub use writer::PostgresWriter;
