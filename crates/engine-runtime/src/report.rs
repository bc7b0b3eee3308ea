use chrono::{DateTime, Utc};
use engine_core::metrics::MetricsSnapshot;
use engine_processing::{TableSummary, error::TableError};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedTable {
    pub table: String,
    pub rows: u64,
    pub chunks: usize,
    pub bytes: u64,
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedTable {
    pub table: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<usize>,
    pub attempts: usize,
}

/// Outcome of a run that was not aborted.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub imported: Vec<ImportedTable>,
    pub failed: Vec<FailedTable>,
    /// Tables stopped by cancellation before completing.
    pub cancelled: Vec<String>,
    pub metrics: MetricsSnapshot,
}

impl MigrationReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            imported: Vec::new(),
            failed: Vec::new(),
            cancelled: Vec::new(),
            metrics: MetricsSnapshot::default(),
        }
    }

    pub fn record_success(&mut self, summary: TableSummary, attempts: usize) {
        self.imported.push(ImportedTable {
            table: summary.table,
            rows: summary.rows,
            chunks: summary.chunks,
            bytes: summary.bytes,
            attempts,
        });
    }

    pub fn record_failure(&mut self, table: &str, error: &TableError, attempts: usize) {
        self.failed.push(FailedTable {
            table: table.to_string(),
            error: error.to_string(),
            chunk: error.chunk(),
            attempts,
        });
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.cancelled.is_empty()
    }

    pub fn failed_tables(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.table.as_str()).collect()
    }
}
