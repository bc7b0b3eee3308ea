use crate::{
    batch::BatchBuilder, context::MigrationContext, error::TableError, format::RowFormatter,
    pipeline::ChunkPipeline, stages::run_table_stages,
};
use connectors::source::{RowStream, SourceDatabase};
use engine_core::settings::ImportMode;
use model::{metadata::column::TargetColumn, records::batch::Batch};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// One table's unit of work. Consumed by a single migration attempt.
pub struct MigrationTask {
    pub table: String,
    pub dest_table: String,
    pub columns: Vec<TargetColumn>,
    pub rows: RowStream,
}

impl MigrationTask {
    /// Resolves target columns and opens a fresh row stream for `table`.
    pub async fn open(source: &dyn SourceDatabase, table: &str) -> Result<Self, TableError> {
        let columns = source
            .list_columns(table)
            .await?
            .iter()
            .map(|column| source.target_column(column))
            .collect::<Result<Vec<_>, _>>()?;
        let rows = source.open_row_stream(table).await?;

        Ok(Self {
            table: table.to_string(),
            dest_table: table.to_string(),
            columns,
            rows,
        })
    }
}

/// Outcome of a successful table migration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSummary {
    pub table: String,
    pub rows: u64,
    pub bytes: u64,
    pub chunks: usize,
}

/// Drives one table from its row stream to the target.
#[derive(Clone)]
pub struct TableMigrator {
    ctx: MigrationContext,
}

impl TableMigrator {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &MigrationContext {
        &self.ctx
    }

    /// Migrates `task` completely. Succeeds only once every batch has been
    /// both written and loaded.
    pub async fn migrate(
        &self,
        task: MigrationTask,
        cancel: &CancellationToken,
    ) -> Result<TableSummary, TableError> {
        if cancel.is_cancelled() {
            return Err(TableError::Cancelled);
        }

        let started = Instant::now();
        let settings = &self.ctx.settings;
        info!(mode = settings.mode.name(), "Importing table");

        if !settings.stages.is_empty() {
            run_table_stages(
                self.ctx.target.as_ref(),
                settings.stages,
                &task.dest_table,
                &task.columns,
            )
            .await?;
        }

        let formatter = RowFormatter::new(settings.format.clone());
        let mut builder = BatchBuilder::new(task.rows, formatter);
        let mut pipeline = ChunkPipeline::start(&task.dest_table, &self.ctx, cancel);

        let mut summary = TableSummary {
            table: task.table,
            ..TableSummary::default()
        };

        if let Err(err) = self
            .produce(&mut builder, &mut pipeline, &mut summary, cancel)
            .await
        {
            pipeline.abort().await;
            return Err(err);
        }

        summary.chunks = pipeline.finish().await?;
        self.ctx.metrics.table_imported(summary.rows, summary.bytes);

        info!(
            rows = summary.rows,
            chunks = summary.chunks,
            bytes = summary.bytes,
            duration_ms = started.elapsed().as_millis(),
            "Successfully imported table"
        );
        Ok(summary)
    }

    async fn produce(
        &self,
        builder: &mut BatchBuilder,
        pipeline: &mut ChunkPipeline,
        summary: &mut TableSummary,
        cancel: &CancellationToken,
    ) -> Result<(), TableError> {
        loop {
            let batch = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TableError::Cancelled),
                batch = self.next_batch(builder) => batch?,
            };

            if batch.is_empty() {
                debug!(rows = builder.rows_read(), "Row stream exhausted");
                return Ok(());
            }

            let rows = batch.len() as u64;
            let bytes = batch.byte_size() as u64;
            pipeline.dispatch(batch).await?;

            summary.rows += rows;
            summary.bytes += bytes;
        }
    }

    async fn next_batch(&self, builder: &mut BatchBuilder) -> Result<Batch, TableError> {
        match &self.ctx.settings.mode {
            ImportMode::Stream { chunk_byte_size } => builder.read_by_bytes(*chunk_byte_size).await,
            ImportMode::Chunked {
                chunk_row_count, ..
            } => builder.read_by_count(*chunk_row_count).await,
        }
    }
}
