//! Error types for the migration library.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Phase of the migration in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    Preparing,
    Extracting,
    Loading,
    Resyncing,
    Committing,
    Completed,
    Failed,
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationPhase::Preparing => "preparing",
            MigrationPhase::Extracting => "extracting",
            MigrationPhase::Loading => "loading",
            MigrationPhase::Resyncing => "resyncing",
            MigrationPhase::Committing => "committing",
            MigrationPhase::Completed => "completed",
            MigrationPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Coarse error classification used for exit codes and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration. No store was touched.
    Configuration,
    /// The source data file does not exist. No store was touched.
    SourceNotFound,
    /// Statement execution or connectivity failure against either store.
    Backend,
}

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (missing target descriptor, invalid YAML values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source database file does not exist
    #[error("Source database not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Source database connection or query error
    #[error("Source database error: {0}")]
    Source(#[from] sqlx::Error),

    /// PostgreSQL target connection or query error
    #[error("Target database error: {0}")]
    Target(#[from] tokio_postgres::Error),

    /// SQLite target connection or query error
    #[error("Target database error: {0}")]
    SqliteTarget(#[source] sqlx::Error),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// Tables named in the migration plan are absent from the target
    #[error("Target is missing tables: {}", .0.join(", "))]
    MissingTargetTables(Vec<String>),

    /// A keyed table has no discoverable key generator in the target
    #[error("No key generator found for {table}.{column}")]
    MissingKeyGenerator { table: String, column: String },

    /// A row's columns differ from the first row of its table
    #[error("Table {table}: row {row} has columns [{found}], expected [{expected}]")]
    NonUniformRows {
        table: String,
        row: usize,
        expected: String,
        found: String,
    },

    /// Source and target row counts differ after a run
    #[error("Row counts differ for tables: {}", .0.join(", "))]
    RowCountMismatch(Vec<String>),

    /// A failure while migrating a specific table
    #[error("Migration failed for table {table} while {phase}: {source}")]
    Table {
        table: String,
        phase: MigrationPhase,
        #[source]
        source: Box<MigrateError>,
    },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl fmt::Display, context: impl Into<String>) -> Self {
        MigrateError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Attach the table and phase in which this error occurred.
    pub fn in_phase(self, table: impl Into<String>, phase: MigrationPhase) -> Self {
        MigrateError::Table {
            table: table.into(),
            phase,
            source: Box::new(self),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrateError::Config(_)
            | MigrateError::Io(_)
            | MigrateError::Yaml(_)
            | MigrateError::Json(_) => ErrorKind::Configuration,
            MigrateError::SourceNotFound(_) => ErrorKind::SourceNotFound,
            MigrateError::Table { source, .. } => match source.kind() {
                ErrorKind::Backend => ErrorKind::Backend,
                other => other,
            },
            _ => ErrorKind::Backend,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Backend => 1,
            ErrorKind::Configuration => 2,
            ErrorKind::SourceNotFound => 3,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
