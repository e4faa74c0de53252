//! Core traits for database-agnostic data migration.
//!
//! This module defines the primary abstractions used by the migration engine:
//!
//! - [`SourceReader`]: Reads whole tables from the source database
//! - [`TargetWriter`]: Executes rendered statements against the target
//! - [`Dialect`]: Renders [`Statement`]s into one backend's SQL
//!
//! # Design Patterns
//!
//! - **Strategy**: `Dialect` provides interchangeable SQL syntax rules
//! - **Template Method**: `Dialect::render` and `TargetWriter::run` define
//!   the algorithm skeleton on top of a few required primitives

use async_trait::async_trait;

use crate::error::Result;

use super::statement::Statement;
use super::value::{Row, SqlValue};

/// Read data from a source database.
#[async_trait]
pub trait SourceReader: Send {
    /// Read every row of a table with a single statement.
    ///
    /// Rows come back in the order the source returns them, each carrying
    /// the statement's column list. An empty table yields an empty vector.
    async fn read_table(&mut self, table: &str) -> Result<Vec<Row>>;

    /// Get the row count for a table.
    async fn row_count(&mut self, table: &str) -> Result<i64>;

    /// Get the database type identifier (e.g., "sqlite").
    fn db_type(&self) -> &str;

    /// Close the connection.
    async fn close(&mut self);
}

/// Execute statements against a target database.
///
/// A writer owns exactly one connection, so transactions opened with
/// [`Statement::Begin`] span every statement until the matching commit or
/// rollback.
#[async_trait]
pub trait TargetWriter: Send {
    /// The dialect used to render statements for this target.
    fn dialect(&self) -> &dyn Dialect;

    /// Execute one SQL statement with bind parameters.
    ///
    /// Returns the number of affected rows where the backend reports it.
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// Run a query returning a single nullable integer in the first column
    /// of the first row.
    async fn query_i64(&mut self, sql: &str) -> Result<Option<i64>>;

    /// Get the database type identifier (e.g., "postgres", "sqlite").
    fn db_type(&self) -> &str;

    /// Close the connection.
    async fn close(&mut self);

    /// Render and execute a logical statement.
    ///
    /// `params` may only be non-empty for statements that render to a
    /// single SQL string.
    async fn run(&mut self, stmt: &Statement<'_>, params: &[SqlValue]) -> Result<u64> {
        let sqls = self.dialect().render(stmt);
        debug_assert!(params.is_empty() || sqls.len() == 1);

        let mut affected = 0;
        for sql in &sqls {
            affected += self.execute(sql, params).await?;
        }
        Ok(affected)
    }

    /// Render and run a logical query returning one nullable integer.
    async fn scalar(&mut self, stmt: &Statement<'_>) -> Result<Option<i64>> {
        let sqls = self.dialect().render(stmt);
        let mut value = None;
        for sql in &sqls {
            value = self.query_i64(sql).await?;
        }
        Ok(value)
    }
}

/// SQL syntax strategy for different database engines.
///
/// Provides database-specific SQL generation while keeping the
/// core migration logic database-agnostic. Each target writer holds its
/// concrete dialect.
pub trait Dialect: Send + Sync {
    /// Quote an identifier (table name, column name, etc.).
    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Quote a string literal.
    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Get a parameter placeholder for the given 1-based index.
    fn param_placeholder(&self, index: usize) -> String;

    /// Largest number of bind parameters one statement may carry.
    fn max_params_per_statement(&self) -> usize;

    /// Build a multi-row INSERT with `rows` groups of placeholders.
    fn build_insert(&self, table: &str, columns: &[String], rows: usize) -> String {
        let col_list = columns
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");

        let width = columns.len();
        let groups = (0..rows)
            .map(|r| {
                let placeholders = (1..=width)
                    .map(|c| self.param_placeholder(r * width + c))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({})", placeholders)
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.quote_ident(table),
            col_list,
            groups
        )
    }

    /// Build the statements that empty `tables` and reset their generators.
    ///
    /// `tables` is in dependency order (referenced tables first).
    fn build_reset_tables(&self, tables: &[&str]) -> Vec<String>;

    /// Build a query returning 1 if the table exists, 0 otherwise.
    fn build_table_exists(&self, table: &str) -> String;

    /// Build a connectivity probe returning the integer 1.
    fn build_ping(&self) -> String {
        "SELECT 1".to_string()
    }

    /// Build a row-count query.
    fn build_row_count(&self, table: &str) -> String {
        format!("SELECT COUNT(*) FROM {}", self.quote_ident(table))
    }

    /// Build a query returning the maximum key value (NULL when empty).
    fn build_max_key(&self, table: &str, key: &str) -> String {
        format!(
            "SELECT MAX({}) FROM {}",
            self.quote_ident(key),
            self.quote_ident(table)
        )
    }

    /// Build a query returning 1 when `table.key` has a key generator.
    fn build_has_key_generator(&self, table: &str, key: &str) -> String;

    /// Build the statements that make the generator return `next` next.
    fn build_set_next_key(&self, table: &str, key: &str, next: i64) -> Vec<String>;

    /// Render a logical statement into this dialect's SQL.
    fn render(&self, stmt: &Statement<'_>) -> Vec<String> {
        match *stmt {
            Statement::Begin => vec!["BEGIN".to_string()],
            Statement::Commit => vec!["COMMIT".to_string()],
            Statement::Rollback => vec!["ROLLBACK".to_string()],
            Statement::Insert {
                table,
                columns,
                rows,
            } => vec![self.build_insert(table, columns, rows)],
            Statement::ResetTables { tables } => self.build_reset_tables(tables),
            Statement::Ping => vec![self.build_ping()],
            Statement::TableExists { table } => vec![self.build_table_exists(table)],
            Statement::RowCount { table } => vec![self.build_row_count(table)],
            Statement::MaxKey { table, key } => vec![self.build_max_key(table, key)],
            Statement::HasKeyGenerator { table, key } => {
                vec![self.build_has_key_generator(table, key)]
            }
            Statement::SetNextKey { table, key, next } => {
                self.build_set_next_key(table, key, next)
            }
        }
    }
}
