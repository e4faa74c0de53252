//! Dialect-neutral statements.
//!
//! The migration logic describes *what* it wants executed as a
//! [`Statement`]; a [`Dialect`](super::traits::Dialect) renders it into the
//! SQL text of the active target just before execution.

/// A logical statement against the target store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement<'a> {
    /// Start a transaction.
    Begin,

    /// Commit the open transaction.
    Commit,

    /// Roll back the open transaction.
    Rollback,

    /// Multi-row insert with one placeholder per value, row-major.
    Insert {
        table: &'a str,
        columns: &'a [String],
        rows: usize,
    },

    /// Empty the tables (given in dependency order) and reset their key
    /// generators so the next generated value is 1.
    ResetTables { tables: &'a [&'a str] },

    /// Single `i64`: 1 when the table exists, 0 otherwise.
    TableExists { table: &'a str },

    /// Single `i64`: 1 when the store answers.
    Ping,

    /// Single `i64`: number of rows in the table.
    RowCount { table: &'a str },

    /// Single nullable `i64`: largest key value, NULL for an empty table.
    MaxKey { table: &'a str, key: &'a str },

    /// Single `i64`: 1 when the key column has a discoverable generator.
    HasKeyGenerator { table: &'a str, key: &'a str },

    /// Make the key generator hand out `next` on its next call.
    SetNextKey {
        table: &'a str,
        key: &'a str,
        next: i64,
    },
}
