use crate::error::TableError;
use connectors::target::{LoadCommand, LoadMethod, LoadTarget};
use engine_core::metrics::Metrics;
use model::{core::format::TextFormat, records::batch::Batch};
use std::sync::Arc;
use tracing::debug;

/// Sends every batch inline, one load command per batch.
pub struct StreamLoader {
    table: String,
    target: Arc<dyn LoadTarget>,
    format: TextFormat,
    metrics: Metrics,
    next_chunk: usize,
}

impl StreamLoader {
    pub fn new(
        table: &str,
        target: Arc<dyn LoadTarget>,
        format: TextFormat,
        metrics: Metrics,
    ) -> Self {
        Self {
            table: table.to_string(),
            target,
            format,
            metrics,
            next_chunk: 0,
        }
    }

    pub async fn dispatch(&mut self, batch: Batch) -> Result<(), TableError> {
        let chunk = self.next_chunk;
        let payload = batch.payload();
        let command =
            LoadCommand::new(&self.table, LoadMethod::Stream(&payload), &self.format).to_string();

        self.target
            .execute(&command)
            .await
            .map_err(|source| TableError::LoadDispatch { chunk, source })?;

        self.next_chunk += 1;
        self.metrics.chunk_loaded();
        debug!(chunk, rows = batch.len(), bytes = batch.byte_size(), "Batch streamed");
        Ok(())
    }

    pub fn chunks_loaded(&self) -> usize {
        self.next_chunk
    }
}
