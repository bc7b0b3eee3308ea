use connectors::{file::ChunkStore, source::SourceDatabase, target::LoadTarget};
use engine_core::{metrics::Metrics, settings::ValidatedSettings};
use std::sync::Arc;

/// Collaborators and settings shared by every table of a run.
#[derive(Clone)]
pub struct MigrationContext {
    pub source: Arc<dyn SourceDatabase>,
    pub target: Arc<dyn LoadTarget>,
    pub store: Arc<dyn ChunkStore>,
    pub settings: Arc<ValidatedSettings>,
    pub metrics: Metrics,
}

impl MigrationContext {
    pub fn new(
        source: Arc<dyn SourceDatabase>,
        target: Arc<dyn LoadTarget>,
        store: Arc<dyn ChunkStore>,
        settings: ValidatedSettings,
    ) -> Self {
        Self {
            source,
            target,
            store,
            settings: Arc::new(settings),
            metrics: Metrics::new(),
        }
    }
}
