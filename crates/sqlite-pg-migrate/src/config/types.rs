//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default rows per bulk-insert batch.
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Smallest batch size honoured; smaller requests are raised to this floor.
pub const MIN_BATCH_SIZE: usize = 100;

/// File name of the source database when no path is given.
pub const DEFAULT_SOURCE_FILE: &str = "maliyet.db";

/// Root configuration structure.
///
/// Built once at process start and passed by value into the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (SQLite file).
    #[serde(default)]
    pub source: SourceConfig,

    /// Target database configuration.
    #[serde(default)]
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Source database (SQLite) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
        }
    }
}

/// Target database configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Connection descriptor: a `postgres://` URL, a libpq `key=value`
    /// string, or a `sqlite:` URL.
    #[serde(default)]
    pub url: String,

    /// TLS mode for PostgreSQL (disable, prefer, require, verify-ca,
    /// verify-full). Falls back to the descriptor's own `sslmode`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_mode: Option<String>,
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("url", &redact_url(&self.url))
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Rows per bulk-insert batch (default 1000, floor 100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    /// Tables to migrate, in dependency order.
    #[serde(default = "builtin_tables")]
    pub tables: Vec<TableSpec>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            batch_size: None,
            tables: builtin_tables(),
        }
    }
}

impl MigrationConfig {
    /// Effective batch size with the floor applied.
    pub fn get_batch_size(&self) -> BatchSize {
        BatchSize::new(self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE))
    }
}

/// A table to migrate. Its position in [`MigrationConfig::tables`] is its
/// place in the dependency order: referenced tables come first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name, identical in source and target.
    pub name: String,

    /// Surrogate integer key column whose generator is resynchronized
    /// after load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surrogate_key: Option<String>,
}

impl TableSpec {
    /// A table with an `id` surrogate key.
    pub fn keyed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            surrogate_key: Some("id".to_string()),
        }
    }

    /// A table without a surrogate key.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            surrogate_key: None,
        }
    }
}

/// Batch size with the minimum enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(usize);

impl BatchSize {
    /// Clamp `requested` up to [`MIN_BATCH_SIZE`].
    pub fn new(requested: usize) -> Self {
        Self(requested.max(MIN_BATCH_SIZE))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(DEFAULT_BATCH_SIZE)
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The application's tables in foreign-key dependency order.
pub fn builtin_tables() -> Vec<TableSpec> {
    [
        "products",
        "raw_materials",
        "cost_definitions",
        "users",
        "product_materials",
        "product_costs",
        "audit_logs",
    ]
    .into_iter()
    .map(TableSpec::keyed)
    .collect()
}

/// `maliyet.db` next to the running executable, or in the working
/// directory when the executable path is unavailable.
pub fn default_source_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_SOURCE_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_FILE))
}

/// Replace the password of a URL-style descriptor with `[REDACTED]`.
pub(crate) fn redact_url(url: &str) -> String {
    if let Some(scheme_end) = url.find("://") {
        let rest = &url[scheme_end + 3..];
        let authority_end = rest.find('/').unwrap_or(rest.len());
        if let Some(at) = rest[..authority_end].rfind('@') {
            if let Some(colon) = rest[..at].find(':') {
                return format!(
                    "{}{}:[REDACTED]{}",
                    &url[..scheme_end + 3],
                    &rest[..colon],
                    &rest[at..]
                );
            }
        }
        return url.to_string();
    }

    // libpq key=value form
    url.split_whitespace()
        .map(|pair| {
            if pair.starts_with("password=") {
                "password=[REDACTED]".to_string()
            } else {
                pair.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
