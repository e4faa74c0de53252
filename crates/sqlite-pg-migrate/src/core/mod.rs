//! Core abstractions for database-agnostic migration.
//!
//! - [`value`]: Row and value representation
//! - [`statement`]: Logical statements rendered per dialect
//! - [`traits`]: Core traits for readers, writers and dialects
//!
//! Driver modules (`drivers/sqlite`, `drivers/postgres`) implement these
//! traits; the orchestrator, transfer and sequence modules only see the
//! abstractions, which keeps them testable against any backend.

pub mod statement;
pub mod traits;
pub mod value;

// Re-export commonly used types for convenience
pub use statement::Statement;
pub use traits::{Dialect, SourceReader, TargetWriter};
pub use value::{Batch, Row, RowSet, SqlValue};
