//! SQLite SQL dialect.
//!
//! SQLite has no TRUNCATE and no named sequences. Tables are emptied with
//! `DELETE` and AUTOINCREMENT generators live as rows of `sqlite_sequence`,
//! where `seq` holds the last value handed out.

use crate::core::traits::Dialect;

/// Default SQLITE_MAX_VARIABLE_NUMBER since SQLite 3.32.
const MAX_PARAMS: usize = 32_766;

/// SQLite dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct SqliteDialect {
    /// Whether `sqlite_sequence` exists, i.e. at least one table in the
    /// database was declared with AUTOINCREMENT.
    has_sequence_table: bool,
}

impl SqliteDialect {
    /// Create a new SQLite dialect instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the database has a `sqlite_sequence` table.
    pub fn with_sequence_table(mut self, present: bool) -> Self {
        self.has_sequence_table = present;
        self
    }
}

impl Dialect for SqliteDialect {
    fn param_placeholder(&self, index: usize) -> String {
        format!("?{}", index)
    }

    fn max_params_per_statement(&self) -> usize {
        MAX_PARAMS
    }

    fn build_reset_tables(&self, tables: &[&str]) -> Vec<String> {
        // Referencing tables go first so enforced foreign keys never block
        let mut sqls: Vec<String> = tables
            .iter()
            .rev()
            .map(|t| format!("DELETE FROM {}", self.quote_ident(t)))
            .collect();

        if self.has_sequence_table && !tables.is_empty() {
            let names = tables
                .iter()
                .map(|t| self.quote_literal(t))
                .collect::<Vec<_>>()
                .join(", ");
            sqls.push(format!("DELETE FROM sqlite_sequence WHERE name IN ({})", names));
        }

        sqls
    }

    fn build_table_exists(&self, table: &str) -> String {
        format!(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = {}",
            self.quote_literal(table)
        )
    }

    fn build_has_key_generator(&self, table: &str, _key: &str) -> String {
        // Every rowid table has a generator: AUTOINCREMENT tables through
        // sqlite_sequence, the others through MAX(rowid) + 1.
        self.build_table_exists(table)
    }

    fn build_set_next_key(&self, table: &str, _key: &str, next: i64) -> Vec<String> {
        if !self.has_sequence_table {
            return Vec::new();
        }

        // Rows for tables without AUTOINCREMENT are ignored by SQLite
        let name = self.quote_literal(table);
        let last = next - 1;
        vec![
            format!("DELETE FROM sqlite_sequence WHERE name = {}", name),
            format!(
                "INSERT INTO sqlite_sequence (name, seq) VALUES ({}, {})",
                name, last
            ),
        ]
    }
}
