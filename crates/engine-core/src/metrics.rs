use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct Counters {
    tables_imported: AtomicU64,
    tables_failed: AtomicU64,
    rows_imported: AtomicU64,
    bytes_imported: AtomicU64,
    chunks_loaded: AtomicU64,
    retries: AtomicU64,
}

/// Run-wide counters shared by every table task.
///
/// Rows and bytes are added once per imported table, so a table that needed
/// several attempts is counted once. `chunks_loaded` counts every load the
/// target accepted, including loads of attempts that failed later.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    counters: Arc<Counters>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub tables_imported: u64,
    pub tables_failed: u64,
    pub rows_imported: u64,
    pub bytes_imported: u64,
    pub chunks_loaded: u64,
    pub retries: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_imported(&self, rows: u64, bytes: u64) {
        let c = &self.counters;
        c.tables_imported.fetch_add(1, Ordering::Relaxed);
        c.rows_imported.fetch_add(rows, Ordering::Relaxed);
        c.bytes_imported.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn table_failed(&self) {
        self.counters.tables_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn chunk_loaded(&self) {
        self.counters.chunks_loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn retry_scheduled(&self) {
        self.counters.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.counters;
        MetricsSnapshot {
            tables_imported: c.tables_imported.load(Ordering::Relaxed),
            tables_failed: c.tables_failed.load(Ordering::Relaxed),
            rows_imported: c.rows_imported.load(Ordering::Relaxed),
            bytes_imported: c.bytes_imported.load(Ordering::Relaxed),
            chunks_loaded: c.chunks_loaded.load(Ordering::Relaxed),
            retries: c.retries.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let metrics = Metrics::new();
        let worker = metrics.clone();

        worker.chunk_loaded();
        worker.chunk_loaded();
        worker.table_imported(10, 120);
        metrics.table_failed();
        metrics.retry_scheduled();

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                tables_imported: 1,
                tables_failed: 1,
                rows_imported: 10,
                bytes_imported: 120,
                chunks_loaded: 2,
                retries: 1,
            }
        );
    }
}
