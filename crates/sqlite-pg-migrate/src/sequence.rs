//! Key generator resynchronization.
//!
//! Rows are inserted with their original surrogate keys, which leaves the
//! target's generator behind. After a keyed table is loaded (inside its
//! transaction) the generator is moved so the next generated key is one
//! past the largest key present.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::statement::Statement;
use crate::core::traits::TargetWriter;
use crate::error::{MigrateError, Result};

/// Generator state after a resync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceState {
    /// Largest key in the table, `None` when empty.
    pub max_key: Option<i64>,
    /// Value the generator hands out next.
    pub next_value: i64,
}

/// Next generated value for a table whose largest key is `max`.
///
/// Never below 1, so empty tables and tables holding only non-positive
/// keys start at 1.
pub fn next_value_after(max: Option<i64>) -> i64 {
    max.map_or(1, |m| m.saturating_add(1)).max(1)
}

/// Point the generator of `table.key` just past the largest stored key.
pub async fn resync(
    writer: &mut dyn TargetWriter,
    table: &str,
    key: &str,
) -> Result<SequenceState> {
    let has_generator = writer
        .scalar(&Statement::HasKeyGenerator { table, key })
        .await?
        .unwrap_or(0);
    if has_generator == 0 {
        return Err(MigrateError::MissingKeyGenerator {
            table: table.to_string(),
            column: key.to_string(),
        });
    }

    let max_key = writer.scalar(&Statement::MaxKey { table, key }).await?;
    let next_value = next_value_after(max_key);

    writer
        .run(
            &Statement::SetNextKey {
                table,
                key,
                next: next_value,
            },
            &[],
        )
        .await?;

    debug!(
        "{}.{}: max key {:?}, next value {}",
        table, key, max_key, next_value
    );

    Ok(SequenceState {
        max_key,
        next_value,
    })
}
