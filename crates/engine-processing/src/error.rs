use connectors::error::{SourceError, TargetError};
use model::error::FormatError;
use std::path::PathBuf;
use thiserror::Error;
use tokio::task::JoinError;

/// Why a single table's migration attempt failed.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Failed to read from source: {0}")]
    SourceRead(#[from] SourceError),

    #[error("Failed to format row: {0}")]
    Format(#[from] FormatError),

    #[error("Failed to write chunk {chunk} to {}: {source}", .path.display())]
    Write {
        chunk: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Load of chunk {chunk} failed: {source}")]
    LoadDispatch {
        chunk: usize,
        #[source]
        source: TargetError,
    },

    #[error("Pre-import stage '{stage}' failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: TargetError,
    },

    #[error("Chunk loader terminated unexpectedly: {0}")]
    LoaderJoin(#[from] JoinError),

    #[error("Migration was cancelled")]
    Cancelled,
}

impl TableError {
    /// Index of the chunk the failure is attributed to, if any.
    pub fn chunk(&self) -> Option<usize> {
        match self {
            TableError::Write { chunk, .. } | TableError::LoadDispatch { chunk, .. } => {
                Some(*chunk)
            }
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TableError::Cancelled)
    }
}
