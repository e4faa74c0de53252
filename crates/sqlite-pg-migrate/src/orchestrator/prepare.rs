//! Target preparation: verify the schema, then wipe every table at once.

use tracing::{info, warn};

use crate::core::statement::Statement;
use crate::core::traits::TargetWriter;
use crate::error::{MigrateError, Result};

/// Check that every table exists, then empty them all and reset their key
/// generators in one transaction.
///
/// `tables` is in dependency order. Nothing is written when a table is
/// missing.
pub async fn prepare_target(writer: &mut dyn TargetWriter, tables: &[&str]) -> Result<()> {
    let mut missing = Vec::new();
    for &table in tables {
        let exists = writer
            .scalar(&Statement::TableExists { table })
            .await?
            .unwrap_or(0);
        if exists == 0 {
            missing.push(table.to_string());
        }
    }
    if !missing.is_empty() {
        return Err(MigrateError::MissingTargetTables(missing));
    }

    writer.run(&Statement::Begin, &[]).await?;

    let reset = async {
        writer.run(&Statement::ResetTables { tables }, &[]).await?;
        writer.run(&Statement::Commit, &[]).await
    }
    .await;

    if let Err(e) = reset {
        rollback_quietly(writer).await;
        return Err(e);
    }

    info!("Target prepared: {} tables emptied", tables.len());
    Ok(())
}

/// Roll back the open transaction, logging instead of failing.
///
/// Used on error paths where the original error is the one to report.
pub(crate) async fn rollback_quietly(writer: &mut dyn TargetWriter) {
    if let Err(e) = writer.run(&Statement::Rollback, &[]).await {
        warn!("Rollback failed: {}", e);
    }
}
