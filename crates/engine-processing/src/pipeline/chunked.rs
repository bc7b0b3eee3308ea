use crate::{context::MigrationContext, error::TableError};
use connectors::{
    file::ChunkStore,
    target::{LoadCommand, LoadMethod, LoadTarget},
};
use engine_core::{metrics::Metrics, settings::ChunkLayout};
use model::{
    core::format::TextFormat,
    records::{batch::Batch, chunk::ChunkDescriptor},
};
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info};

/// Writes batches to chunk files and loads them from a background task.
///
/// A chunk is enqueued only after its file is fully written, and a single
/// loader drains the queue in order, so loads follow chunk-index order. The
/// loader stops at the first failed load; later chunks are never loaded and
/// the writer learns about the failure on its next enqueue. Dropping the
/// loader cancels the background task before its next job.
pub struct ChunkedLoader {
    table: String,
    layout: ChunkLayout,
    store: Arc<dyn ChunkStore>,
    format: TextFormat,
    jobs: Option<mpsc::Sender<ChunkDescriptor>>,
    loader: Option<JoinHandle<Result<usize, TableError>>>,
    cancel: CancellationToken,
    next_chunk: usize,
}

impl ChunkedLoader {
    /// Starts the loader task before any batch is written.
    pub fn start(
        table: &str,
        layout: ChunkLayout,
        ctx: &MigrationContext,
        cancel: CancellationToken,
    ) -> Self {
        let format = ctx.settings.format.clone();
        let (tx, rx) = mpsc::channel(ctx.settings.load_queue_capacity.get());
        let loader = tokio::spawn(
            run_loader(
                table.to_string(),
                ctx.target.clone(),
                format.clone(),
                ctx.metrics.clone(),
                rx,
                cancel.clone(),
            )
            .instrument(Span::current()),
        );

        Self {
            table: table.to_string(),
            layout,
            store: ctx.store.clone(),
            format,
            jobs: Some(tx),
            loader: Some(loader),
            cancel,
            next_chunk: 0,
        }
    }

    /// Writes `batch` as the next chunk and queues its load.
    pub async fn dispatch(&mut self, batch: Batch) -> Result<(), TableError> {
        let chunk = self.layout.descriptor(&self.table, self.next_chunk);
        let contents = self.format.encoding.encode(&batch.payload())?;

        self.store
            .write(&chunk.file_path, &contents)
            .await
            .map_err(|source| TableError::Write {
                chunk: chunk.index,
                path: chunk.file_path.clone(),
                source,
            })?;
        debug!(chunk = chunk.index, path = %chunk.file_path.display(), rows = batch.len(), "Chunk written");
        self.next_chunk += 1;

        let Some(jobs) = &self.jobs else {
            return Err(TableError::Cancelled);
        };
        if jobs.send(chunk).await.is_err() {
            // The loader only drops its receiver when it stops early.
            return Err(self.loader_failure().await);
        }

        Ok(())
    }

    /// Closes the queue and waits for every queued chunk to be loaded.
    /// Returns the number of chunks loaded.
    pub async fn finish(mut self) -> Result<usize, TableError> {
        self.jobs.take();
        self.join_loader().await
    }

    /// Stops the loader before its next job and waits for it to exit.
    pub async fn abort(mut self) {
        self.cancel.cancel();
        self.jobs.take();
        if let Err(err) = self.join_loader().await
            && !err.is_cancelled()
        {
            debug!(error = %err, "Loader stopped with an error during abort");
        }
    }

    async fn loader_failure(&mut self) -> TableError {
        self.jobs.take();
        match self.join_loader().await {
            Err(err) => err,
            Ok(_) => TableError::Cancelled,
        }
    }

    async fn join_loader(&mut self) -> Result<usize, TableError> {
        match self.loader.take() {
            Some(handle) => handle.await?,
            None => Err(TableError::Cancelled),
        }
    }
}

impl Drop for ChunkedLoader {
    /// The loader task outlives a dropped pipeline unless told to stop.
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_loader(
    table: String,
    target: Arc<dyn LoadTarget>,
    format: TextFormat,
    metrics: Metrics,
    mut jobs: mpsc::Receiver<ChunkDescriptor>,
    cancel: CancellationToken,
) -> Result<usize, TableError> {
    let mut loaded = 0;

    loop {
        let job = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(loaded, "Chunk loader cancelled");
                return Err(TableError::Cancelled);
            }
            job = jobs.recv() => job,
        };

        let Some(chunk) = job else {
            break;
        };

        let command = LoadCommand::new(
            &table,
            LoadMethod::Infile(&chunk.reference_path),
            &format,
        )
        .to_string();

        if let Err(source) = target.execute(&command).await {
            error!(chunk = chunk.index, error = %source, "Chunk load failed");
            return Err(TableError::LoadDispatch {
                chunk: chunk.index,
                source,
            });
        }

        loaded += 1;
        metrics.chunk_loaded();
        debug!(chunk = chunk.index, path = %chunk.reference_path, "Chunk loaded");
    }

    Ok(loaded)
}
