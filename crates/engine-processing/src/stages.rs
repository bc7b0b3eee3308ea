use crate::error::TableError;
use connectors::target::{LoadTarget, TableCommand};
use engine_core::settings::TableStages;
use model::metadata::column::TargetColumn;
use tracing::{info, warn};

/// Runs the configured pre-import commands for one table.
///
/// A failed drop is tolerated since the table may not exist yet.
pub async fn run_table_stages(
    target: &dyn LoadTarget,
    stages: TableStages,
    table: &str,
    columns: &[TargetColumn],
) -> Result<(), TableError> {
    if stages.drop_existing {
        let command = TableCommand::Drop { table }.to_string();
        match target.execute(&command).await {
            Ok(()) => info!("Dropped existing table"),
            Err(err) => warn!(error = %err, "Could not drop table, continuing"),
        }
    }

    if stages.create_tables {
        let command = TableCommand::Create { table, columns }.to_string();
        target
            .execute(&command)
            .await
            .map_err(|source| TableError::Stage {
                stage: "create_table",
                source,
            })?;
        info!(columns = columns.len(), "Created table");
    }

    Ok(())
}
