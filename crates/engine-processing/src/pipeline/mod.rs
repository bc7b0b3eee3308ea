use crate::{context::MigrationContext, error::TableError};
use engine_core::settings::ImportMode;
use model::records::batch::Batch;
use tokio_util::sync::CancellationToken;

pub mod chunked;
pub mod stream;

pub use chunked::ChunkedLoader;
pub use stream::StreamLoader;

/// Delivers one table's batches to the target.
pub enum ChunkPipeline {
    Stream(StreamLoader),
    Chunked(ChunkedLoader),
}

impl ChunkPipeline {
    /// Builds the pipeline for the configured mode. In chunked mode the
    /// loader task is already running when this returns.
    pub fn start(table: &str, ctx: &MigrationContext, cancel: &CancellationToken) -> Self {
        let settings = &ctx.settings;
        match &settings.mode {
            ImportMode::Stream { .. } => ChunkPipeline::Stream(StreamLoader::new(
                table,
                ctx.target.clone(),
                settings.format.clone(),
                ctx.metrics.clone(),
            )),
            ImportMode::Chunked { layout, .. } => ChunkPipeline::Chunked(ChunkedLoader::start(
                table,
                layout.clone(),
                ctx,
                cancel.child_token(),
            )),
        }
    }

    pub async fn dispatch(&mut self, batch: Batch) -> Result<(), TableError> {
        match self {
            ChunkPipeline::Stream(loader) => loader.dispatch(batch).await,
            ChunkPipeline::Chunked(loader) => loader.dispatch(batch).await,
        }
    }

    /// Waits until every dispatched batch is loaded; returns the chunk count.
    pub async fn finish(self) -> Result<usize, TableError> {
        match self {
            ChunkPipeline::Stream(loader) => Ok(loader.chunks_loaded()),
            ChunkPipeline::Chunked(loader) => loader.finish().await,
        }
    }

    /// Abandons the remaining work after a failure or cancellation.
    pub async fn abort(self) {
        if let ChunkPipeline::Chunked(loader) = self {
            loader.abort().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use connectors::{
        file::{ChunkStore, LocalChunkStore},
        memory::{MemorySource, MemoryTarget},
    };
    use engine_core::settings::{ChunkLayout, FailurePolicyKind, TableStages, ValidatedSettings};
    use model::core::format::TextFormat;
    use std::{
        io,
        num::NonZeroUsize,
        path::{Path, PathBuf},
        sync::{Arc, Mutex},
        time::Duration,
    };

    /// Store whose early chunks take longer to write than later ones.
    #[derive(Default)]
    struct SlowStore {
        written: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl ChunkStore for SlowStore {
        async fn write(&self, path: &Path, _contents: &[u8]) -> io::Result<()> {
            let written = self.written.lock().unwrap().len() as u64;
            tokio::time::sleep(Duration::from_millis(30u64.saturating_sub(written * 5))).await;
            self.written.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl ChunkStore for FailingStore {
        async fn write(&self, _path: &Path, _contents: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    fn settings(mode: ImportMode) -> ValidatedSettings {
        ValidatedSettings {
            format: TextFormat::default(),
            mode,
            import_limit: NonZeroUsize::new(1).unwrap(),
            include_tables: None,
            exclude_tables: None,
            failure_policy: FailurePolicyKind::Abort,
            load_queue_capacity: NonZeroUsize::new(2).unwrap(),
            stages: TableStages::default(),
            shutdown_grace: Duration::from_secs(1),
        }
    }

    fn chunked(dir: &Path) -> ImportMode {
        ImportMode::Chunked {
            chunk_row_count: NonZeroUsize::new(2).unwrap(),
            layout: ChunkLayout::new(dir, Some("alice"), Some("in".to_string()), Some("dat".to_string())),
        }
    }

    fn context(
        target: &MemoryTarget,
        store: Arc<dyn ChunkStore>,
        mode: ImportMode,
    ) -> MigrationContext {
        MigrationContext::new(
            Arc::new(MemorySource::new()),
            Arc::new(target.clone()),
            store,
            settings(mode),
        )
    }

    fn batch(lines: &[&str]) -> Batch {
        let mut batch = Batch::new();
        for line in lines {
            batch.push(line.to_string(), line.len());
        }
        batch
    }

    #[tokio::test]
    async fn test_chunk_loads_follow_index_order() {
        let target = MemoryTarget::new().with_delay(Duration::from_millis(10));
        let store = Arc::new(SlowStore::default());
        let ctx = context(&target, store.clone(), chunked(Path::new("/up")));

        let mut pipeline = ChunkPipeline::start("orders", &ctx, &CancellationToken::new());
        for i in 0..5 {
            pipeline.dispatch(batch(&[format!("{i}\n").as_str()])).await.unwrap();
        }
        let loaded = pipeline.finish().await.unwrap();

        assert_eq!(loaded, 5);
        let expected: Vec<String> = (0..5)
            .map(|i| {
                format!(
                    "load data infile in/orders_{i}.dat into table orders fields terminated by '|' enclosed by '\"' lines terminated by '\n'"
                )
            })
            .collect();
        assert_eq!(target.commands(), expected);
        assert_eq!(
            store.written.lock().unwrap()[4],
            PathBuf::from("/up/alice/in/orders_4.dat")
        );
        assert_eq!(ctx.metrics.snapshot().chunks_loaded, 5);
    }

    #[tokio::test]
    async fn test_chunk_files_hold_the_payload() {
        let dir = tempfile::tempdir().unwrap();
        let target = MemoryTarget::new();
        let ctx = context(&target, Arc::new(LocalChunkStore), chunked(dir.path()));

        let mut pipeline = ChunkPipeline::start("users", &ctx, &CancellationToken::new());
        pipeline.dispatch(batch(&["\"a\"|1\n", "\"b\"|2\n"])).await.unwrap();
        pipeline.finish().await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("alice/in/users_0.dat")).unwrap();
        assert_eq!(written, "\"a\"|1\n\"b\"|2\n");
    }

    #[tokio::test]
    async fn test_load_failure_stops_later_chunks() {
        let target = MemoryTarget::new().rejecting("orders_1.dat");
        let ctx = context(&target, Arc::new(SlowStore::default()), chunked(Path::new("/up")));

        let mut pipeline = ChunkPipeline::start("orders", &ctx, &CancellationToken::new());
        let mut failure = None;
        for i in 0..6 {
            if let Err(err) = pipeline.dispatch(batch(&[format!("{i}\n").as_str()])).await {
                failure = Some(err);
                break;
            }
        }

        let err = match failure {
            Some(err) => {
                pipeline.abort().await;
                err
            }
            None => pipeline.finish().await.unwrap_err(),
        };

        assert!(matches!(err, TableError::LoadDispatch { chunk: 1, .. }));
        let commands = target.commands();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].contains("orders_0.dat"));
    }

    #[tokio::test]
    async fn test_write_failure_reports_the_chunk() {
        let target = MemoryTarget::new();
        let ctx = context(&target, Arc::new(FailingStore), chunked(Path::new("/up")));

        let mut pipeline = ChunkPipeline::start("orders", &ctx, &CancellationToken::new());
        let err = pipeline.dispatch(batch(&["1\n"])).await.unwrap_err();
        pipeline.abort().await;

        assert!(matches!(err, TableError::Write { chunk: 0, .. }));
        assert!(target.commands().is_empty());
    }

    #[tokio::test]
    async fn test_stream_mode_inlines_each_batch() {
        let target = MemoryTarget::new();
        let ctx = context(
            &target,
            Arc::new(FailingStore),
            ImportMode::Stream { chunk_byte_size: 64 },
        );

        let mut pipeline = ChunkPipeline::start("users", &ctx, &CancellationToken::new());
        pipeline.dispatch(batch(&["\"a\"|1\n", "\"b\"|2\n"])).await.unwrap();
        pipeline.dispatch(batch(&["\"c\"|3\n"])).await.unwrap();

        assert_eq!(pipeline.finish().await.unwrap(), 2);
        assert_eq!(
            target.commands(),
            vec![
                "load data stream '\"a\"|1\n\"b\"|2\n' into table users fields terminated by '|' enclosed by '\"' lines terminated by '\n'",
                "load data stream '\"c\"|3\n' into table users fields terminated by '|' enclosed by '\"' lines terminated by '\n'",
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_loader_surfaces_on_dispatch() {
        let target = MemoryTarget::new();
        let ctx = context(&target, Arc::new(SlowStore::default()), chunked(Path::new("/up")));
        let cancel = CancellationToken::new();

        let mut pipeline = ChunkPipeline::start("orders", &ctx, &cancel);
        cancel.cancel();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let err = pipeline.dispatch(batch(&["1\n"])).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(target.commands().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_pipeline_stops_loading() {
        let target = MemoryTarget::new().with_delay(Duration::from_millis(30));
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(chunked(dir.path()));
        settings.load_queue_capacity = NonZeroUsize::new(8).unwrap();
        let ctx = MigrationContext::new(
            Arc::new(MemorySource::new()),
            Arc::new(target.clone()),
            Arc::new(LocalChunkStore),
            settings,
        );

        let mut pipeline = ChunkPipeline::start("orders", &ctx, &CancellationToken::new());
        for i in 0..6 {
            pipeline.dispatch(batch(&[format!("{i}\n").as_str()])).await.unwrap();
        }
        drop(pipeline);

        tokio::time::sleep(Duration::from_millis(250)).await;
        let loads = target.commands().len();
        assert!(loads < 6, "loader kept running after drop: {loads} loads");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(target.commands().len(), loads);
    }
}
