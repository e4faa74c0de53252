//! In-memory doubles shared by unit tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::core::traits::{Dialect, SourceReader, TargetWriter};
use crate::core::value::{Row, SqlValue};
use crate::drivers::PostgresDialect;
use crate::error::{MigrateError, Result};

type Responder = Box<dyn FnMut(&str) -> Option<i64> + Send>;

/// Target writer that records every statement instead of running it.
pub(crate) struct RecordingWriter {
    dialect: PostgresDialect,
    /// Executed SQL with its parameter count.
    pub executed: Vec<(String, usize)>,
    /// Scalar queries, in order.
    pub queries: Vec<String>,
    /// Fail the n-th INSERT statement (1-based).
    pub fail_on_insert: Option<usize>,
    inserts: usize,
    responder: Responder,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self {
            dialect: PostgresDialect::new(),
            executed: Vec::new(),
            queries: Vec::new(),
            fail_on_insert: None,
            inserts: 0,
            responder: Box::new(|_| Some(1)),
        }
    }

    /// Answer scalar queries with `f` instead of `Some(1)`.
    pub fn respond_with(mut self, f: impl FnMut(&str) -> Option<i64> + Send + 'static) -> Self {
        self.responder = Box::new(f);
        self
    }

    pub fn statements(&self) -> Vec<&str> {
        self.executed.iter().map(|(sql, _)| sql.as_str()).collect()
    }

    pub fn insert_param_counts(&self) -> Vec<usize> {
        self.executed
            .iter()
            .filter(|(sql, _)| sql.starts_with("INSERT"))
            .map(|(_, n)| *n)
            .collect()
    }
}

#[async_trait]
impl TargetWriter for RecordingWriter {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        self.executed.push((sql.to_string(), params.len()));
        if sql.starts_with("INSERT") {
            self.inserts += 1;
            if self.fail_on_insert == Some(self.inserts) {
                return Err(MigrateError::pool("injected failure", "recording writer"));
            }
        }
        Ok(0)
    }

    async fn query_i64(&mut self, sql: &str) -> Result<Option<i64>> {
        self.queries.push(sql.to_string());
        Ok((self.responder)(sql))
    }

    fn db_type(&self) -> &str {
        "recording"
    }

    async fn close(&mut self) {}
}

/// Source reader over in-memory tables.
pub(crate) struct MemorySource {
    tables: HashMap<String, Vec<Row>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Add a table of `count` rows with an `id` key starting at 1.
    pub fn with_keyed_rows(mut self, table: &str, count: i64) -> Self {
        let rows = (1..=count)
            .map(|id| {
                Row::from_pairs([
                    ("id", SqlValue::Integer(id)),
                    ("name", SqlValue::Text(format!("{}-{}", table, id))),
                ])
            })
            .collect();
        self.tables.insert(table.to_string(), rows);
        self
    }

    pub fn with_rows(mut self, table: &str, rows: Vec<Row>) -> Self {
        self.tables.insert(table.to_string(), rows);
        self
    }
}

#[async_trait]
impl SourceReader for MemorySource {
    async fn read_table(&mut self, table: &str) -> Result<Vec<Row>> {
        Ok(self.tables.get(table).cloned().unwrap_or_default())
    }

    async fn row_count(&mut self, table: &str) -> Result<i64> {
        Ok(self.tables.get(table).map_or(0, |rows| rows.len() as i64))
    }

    fn db_type(&self) -> &str {
        "memory"
    }

    async fn close(&mut self) {}
}
