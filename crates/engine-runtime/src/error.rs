use connectors::error::SourceError;
use engine_processing::error::TableError;
use thiserror::Error;

/// Top-level errors for a migration run.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A table failed under the abort policy; every other table was cancelled.
    #[error("Migration aborted after table '{table}' failed: {source}")]
    Aborted {
        table: String,
        #[source]
        source: TableError,
    },

    /// The table list could not be read.
    #[error("Failed to enumerate source tables: {0}")]
    Source(#[from] SourceError),

    /// A table task panicked; the remaining tables were cancelled.
    #[error("Task for table '{table}' panicked: {source}")]
    TablePanicked {
        table: String,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("Migration was cancelled")]
    Cancelled,
}
