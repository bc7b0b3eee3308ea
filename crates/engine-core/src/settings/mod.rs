use crate::retry::RetryPolicy;
use model::core::encoding::Encoding;
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

pub mod error;
pub mod layout;
pub mod validated;

pub use error::SettingsError;
pub use layout::ChunkLayout;
pub use validated::{FailurePolicyKind, ImportMode, TableStages, ValidatedSettings};

pub const DEFAULT_CHUNK_ROWS: usize = 100_000;
pub const DEFAULT_CHUNK_BYTES: usize = 1_048_576;
pub const DEFAULT_FILE_EXTENSION: &str = "dat";
pub const DEFAULT_IMPORT_LIMIT: usize = 5;

/// How batches reach the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportModeKind {
    /// Rows are inlined in one load command per batch.
    Stream,
    /// Batches are written to chunk files that load commands reference.
    #[default]
    Chunked,
}

/// What happens to the run when a table fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicySetting {
    #[default]
    Abort,
    Continue,
    Retry(RetrySettings),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(s: &RetrySettings) -> Self {
        RetryPolicy::new(
            s.max_attempts,
            Duration::from_millis(s.base_delay_ms),
            Duration::from_millis(s.max_delay_ms),
        )
    }
}

/// Import options as written in the `[import]` section of a config file.
///
/// Every field has a default, so an empty section is valid for stream mode.
/// Call [`ImportSettings::validate`] before use.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub field_terminator: String,
    pub field_wrapper: String,
    pub line_terminator: String,
    pub encoding: String,
    pub mode: ImportModeKind,
    pub chunk_row_count: usize,
    pub chunk_byte_size: usize,
    /// Extension of chunk files; empty omits it.
    pub file_extension: String,
    pub upload_folder: Option<PathBuf>,
    pub user: Option<String>,
    pub user_folder: Option<String>,
    pub import_limit: usize,
    pub include_tables: Option<Vec<String>>,
    pub exclude_tables: Option<Vec<String>>,
    pub failure_policy: FailurePolicySetting,
    pub load_queue_capacity: usize,
    pub create_tables: bool,
    pub drop_existing: bool,
    pub shutdown_grace_secs: u64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            field_terminator: "|".to_string(),
            field_wrapper: "\"".to_string(),
            line_terminator: "\n".to_string(),
            encoding: Encoding::Utf8.to_string(),
            mode: ImportModeKind::default(),
            chunk_row_count: DEFAULT_CHUNK_ROWS,
            chunk_byte_size: DEFAULT_CHUNK_BYTES,
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            upload_folder: None,
            user: None,
            user_folder: None,
            import_limit: DEFAULT_IMPORT_LIMIT,
            include_tables: None,
            exclude_tables: None,
            failure_policy: FailurePolicySetting::default(),
            load_queue_capacity: 4,
            create_tables: false,
            drop_existing: false,
            shutdown_grace_secs: 30,
        }
    }
}
