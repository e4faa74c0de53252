//! Batched bulk loading of one table into the target.
//!
//! Rows are sent as multi-row INSERT statements inside the table's
//! transaction, which the caller opens and closes. A batch that needs more
//! bind parameters than the dialect allows is split across several
//! statements; since they share the transaction the batch still lands or
//! fails as a whole.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::BatchSize;
use crate::core::statement::Statement;
use crate::core::traits::TargetWriter;
use crate::core::value::{Batch, RowSet, SqlValue};
use crate::error::Result;

/// Progress update sent after every committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Table being loaded.
    pub table: String,
    /// Rows inserted so far, cumulative within the table.
    pub inserted: u64,
    /// Rows the table will have when done.
    pub total: u64,
}

/// Loads tables batch by batch.
pub struct BatchLoader {
    batch_size: BatchSize,
    progress_tx: Option<mpsc::Sender<ProgressUpdate>>,
}

impl BatchLoader {
    /// Create a loader with the given batch size.
    pub fn new(batch_size: BatchSize) -> Self {
        Self {
            batch_size,
            progress_tx: None,
        }
    }

    /// Set progress channel for updates.
    ///
    /// The channel is awaited on, so the receiver must be drained while a
    /// load is running.
    pub fn with_progress(mut self, tx: mpsc::Sender<ProgressUpdate>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Send progress update if channel is configured.
    async fn send_progress(&self, update: ProgressUpdate) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(update).await;
        }
    }

    /// Insert every row of `rows` into `table`, returning the inserted count.
    ///
    /// An empty set issues no statements. The first failing statement
    /// aborts the load; nothing is retried.
    pub async fn load_table(
        &self,
        writer: &mut dyn TargetWriter,
        table: &str,
        rows: &RowSet,
    ) -> Result<u64> {
        if rows.is_empty() {
            debug!("{}: nothing to load", table);
            return Ok(0);
        }

        let columns = rows.columns();
        let rows_per_statement = rows_per_statement(
            writer.dialect().max_params_per_statement(),
            columns.len(),
        );
        let total = rows.len() as u64;
        let mut inserted = 0u64;

        for (idx, batch) in rows.batches(self.batch_size.get()).enumerate() {
            insert_batch(writer, table, columns, batch, rows_per_statement).await?;
            inserted += batch.len() as u64;

            info!("{}: {}/{} rows", table, inserted, total);
            debug!("{}: batch {} done ({} rows)", table, idx + 1, batch.len());
            self.send_progress(ProgressUpdate {
                table: table.to_string(),
                inserted,
                total,
            })
            .await;
        }

        Ok(inserted)
    }
}

/// Rows that fit in one statement under the parameter limit.
fn rows_per_statement(max_params: usize, width: usize) -> usize {
    (max_params / width.max(1)).max(1)
}

async fn insert_batch(
    writer: &mut dyn TargetWriter,
    table: &str,
    columns: &[String],
    batch: Batch<'_>,
    rows_per_statement: usize,
) -> Result<()> {
    for chunk in batch.rows().chunks(rows_per_statement) {
        let params: Vec<SqlValue> = chunk.iter().flatten().cloned().collect();
        let stmt = Statement::Insert {
            table,
            columns,
            rows: chunk.len(),
        };
        writer.run(&stmt, &params).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Row;
    use crate::test_support::RecordingWriter;

    fn row_set(count: i64, width: usize) -> RowSet {
        let rows = (0..count)
            .map(|i| {
                Row::from_pairs((0..width).map(|c| (format!("c{}", c), SqlValue::Integer(i))))
            })
            .collect();
        RowSet::from_rows("t", rows).unwrap()
    }

    #[tokio::test]
    async fn test_batches_and_progress() {
        let (tx, mut rx) = mpsc::channel(16);
        let loader = BatchLoader::new(BatchSize::new(1000)).with_progress(tx);
        let mut writer = RecordingWriter::new();

        let inserted = loader
            .load_table(&mut writer, "products", &row_set(2500, 2))
            .await
            .unwrap();
        assert_eq!(inserted, 2500);
        assert_eq!(writer.insert_param_counts(), vec![2000, 2000, 1000]);

        drop(loader);
        let mut progress = Vec::new();
        while let Some(update) = rx.recv().await {
            assert_eq!(update.total, 2500);
            progress.push(update.inserted);
        }
        assert_eq!(progress, vec![1000, 2000, 2500]);
    }

    #[tokio::test]
    async fn test_empty_set_issues_nothing() {
        let loader = BatchLoader::new(BatchSize::default());
        let mut writer = RecordingWriter::new();
        let inserted = loader
            .load_table(&mut writer, "users", &RowSet::default())
            .await
            .unwrap();
        assert_eq!(inserted, 0);
        assert!(writer.executed.is_empty());
    }

    #[tokio::test]
    async fn test_wide_batch_split_at_parameter_limit() {
        // 1000 rows x 100 columns = 100_000 params, over PostgreSQL's 65_535
        let loader = BatchLoader::new(BatchSize::new(1000));
        let mut writer = RecordingWriter::new();
        loader
            .load_table(&mut writer, "wide", &row_set(1000, 100))
            .await
            .unwrap();
        assert_eq!(writer.insert_param_counts(), vec![65_500, 34_500]);
    }

    #[tokio::test]
    async fn test_failure_stops_load() {
        let loader = BatchLoader::new(BatchSize::new(100));
        let mut writer = RecordingWriter::new();
        writer.fail_on_insert = Some(2);

        let err = loader
            .load_table(&mut writer, "products", &row_set(350, 1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("injected failure"));
        assert_eq!(writer.insert_param_counts().len(), 2);
    }

    #[test]
    fn test_rows_per_statement() {
        assert_eq!(rows_per_statement(65_535, 7), 9_362);
        assert_eq!(rows_per_statement(10, 0), 10);
        assert_eq!(rows_per_statement(10, 50), 1);
    }
}
