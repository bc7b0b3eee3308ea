use super::{
    ChunkLayout, FailurePolicySetting, ImportModeKind, ImportSettings, SettingsError,
};
use crate::retry::RetryPolicy;
use model::core::{encoding::Encoding, format::TextFormat};
use std::{num::NonZeroUsize, time::Duration};
use tracing::warn;

/// Delivery strategy together with the batch bound it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportMode {
    /// Batches are bounded by encoded byte size and sent inline.
    Stream { chunk_byte_size: usize },
    /// Batches are bounded by row count and written to chunk files.
    Chunked {
        chunk_row_count: NonZeroUsize,
        layout: ChunkLayout,
    },
}

impl ImportMode {
    pub fn name(&self) -> &'static str {
        match self {
            ImportMode::Stream { .. } => "stream",
            ImportMode::Chunked { .. } => "chunked",
        }
    }
}

/// Resolved failure policy. Custom handlers are supplied in code, not config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailurePolicyKind {
    Abort,
    Continue,
    Retry(RetryPolicy),
}

/// Commands issued to the target before a table's first batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStages {
    pub drop_existing: bool,
    pub create_tables: bool,
}

impl TableStages {
    pub fn is_empty(&self) -> bool {
        !self.drop_existing && !self.create_tables
    }
}

/// Immutable, validated import configuration.
#[derive(Debug, Clone)]
pub struct ValidatedSettings {
    pub format: TextFormat,
    pub mode: ImportMode,
    pub import_limit: NonZeroUsize,
    pub include_tables: Option<Vec<String>>,
    pub exclude_tables: Option<Vec<String>>,
    pub failure_policy: FailurePolicyKind,
    pub load_queue_capacity: NonZeroUsize,
    pub stages: TableStages,
    pub shutdown_grace: Duration,
}

impl ImportSettings {
    pub fn validate(&self) -> Result<ValidatedSettings, SettingsError> {
        let format = self.text_format()?;

        let mode = match self.mode {
            ImportModeKind::Stream => {
                if self.chunk_byte_size == 0 {
                    return Err(SettingsError::Zero("chunk_byte_size"));
                }
                ImportMode::Stream {
                    chunk_byte_size: self.chunk_byte_size,
                }
            }
            ImportModeKind::Chunked => {
                let chunk_row_count = NonZeroUsize::new(self.chunk_row_count)
                    .ok_or(SettingsError::Zero("chunk_row_count"))?;
                let upload_folder = self
                    .upload_folder
                    .as_ref()
                    .ok_or(SettingsError::MissingUploadFolder)?;
                let file_extension = Some(self.file_extension.trim_start_matches('.'))
                    .filter(|ext| !ext.is_empty())
                    .map(str::to_string);
                let user_folder = self.user_folder.clone().filter(|f| !f.is_empty());

                ImportMode::Chunked {
                    chunk_row_count,
                    layout: ChunkLayout::new(
                        upload_folder,
                        self.user.as_deref(),
                        user_folder,
                        file_extension,
                    ),
                }
            }
        };

        let import_limit =
            NonZeroUsize::new(self.import_limit).ok_or(SettingsError::Zero("import_limit"))?;
        let load_queue_capacity = NonZeroUsize::new(self.load_queue_capacity)
            .ok_or(SettingsError::Zero("load_queue_capacity"))?;

        if matches!(&self.include_tables, Some(patterns) if patterns.is_empty()) {
            warn!("Empty 'include_tables' list selects every table");
        }

        let failure_policy = match &self.failure_policy {
            FailurePolicySetting::Abort => FailurePolicyKind::Abort,
            FailurePolicySetting::Continue => FailurePolicyKind::Continue,
            FailurePolicySetting::Retry(retry) => {
                if retry.max_attempts == 0 {
                    return Err(SettingsError::Zero("failure_policy.retry.max_attempts"));
                }
                FailurePolicyKind::Retry(RetryPolicy::from(retry))
            }
        };

        Ok(ValidatedSettings {
            format,
            mode,
            import_limit,
            include_tables: self.include_tables.clone().filter(|p| !p.is_empty()),
            exclude_tables: self.exclude_tables.clone().filter(|p| !p.is_empty()),
            failure_policy,
            load_queue_capacity,
            stages: TableStages {
                drop_existing: self.drop_existing,
                create_tables: self.create_tables,
            },
            shutdown_grace: Duration::from_secs(self.shutdown_grace_secs),
        })
    }

    fn text_format(&self) -> Result<TextFormat, SettingsError> {
        if self.field_terminator.is_empty() {
            return Err(SettingsError::Empty("field_terminator"));
        }
        if self.line_terminator.is_empty() {
            return Err(SettingsError::Empty("line_terminator"));
        }
        if !self.field_wrapper.is_empty()
            && (self.field_wrapper == self.field_terminator
                || self.field_wrapper == self.line_terminator)
        {
            return Err(SettingsError::WrapperCollision(self.field_wrapper.clone()));
        }

        let encoding: Encoding = self.encoding.parse()?;

        Ok(TextFormat {
            field_terminator: self.field_terminator.clone(),
            field_wrapper: self.field_wrapper.clone(),
            line_terminator: self.line_terminator.clone(),
            encoding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(toml_src: &str) -> ImportSettings {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn test_defaults_for_stream_mode() {
        let settings = parse(r#"mode = "stream""#).validate().unwrap();

        assert_eq!(settings.format, TextFormat::default());
        assert_eq!(
            settings.mode,
            ImportMode::Stream {
                chunk_byte_size: 1_048_576
            }
        );
        assert_eq!(settings.import_limit.get(), 5);
        assert_eq!(settings.load_queue_capacity.get(), 4);
        assert_eq!(settings.failure_policy, FailurePolicyKind::Abort);
        assert!(settings.stages.is_empty());
        assert_eq!(settings.shutdown_grace, Duration::from_secs(30));
    }

    #[test]
    fn test_chunked_mode_layout() {
        let settings = parse(
            r#"
            upload_folder = "/srv/upload"
            user = "main"
            user_folder = "imports"
            file_extension = ""
            chunk_row_count = 50
            "#,
        )
        .validate()
        .unwrap();

        let ImportMode::Chunked {
            chunk_row_count,
            layout,
        } = settings.mode
        else {
            panic!("expected chunked mode");
        };

        assert_eq!(chunk_row_count.get(), 50);
        assert_eq!(layout.upload_folder, PathBuf::from("/srv/upload/main"));
        assert_eq!(layout.reference_path("users", 3), "imports/users_3");
    }

    #[test]
    fn test_chunked_mode_requires_upload_folder() {
        let err = ImportSettings::default().validate().unwrap_err();
        assert_eq!(err, SettingsError::MissingUploadFolder);
    }

    #[test]
    fn test_retry_policy_from_table() {
        let settings = parse(
            r#"
            mode = "stream"
            failure_policy = { retry = { max_attempts = 4, base_delay_ms = 10 } }
            "#,
        )
        .validate()
        .unwrap();

        assert_eq!(
            settings.failure_policy,
            FailurePolicyKind::Retry(RetryPolicy::new(
                4,
                Duration::from_millis(10),
                Duration::from_millis(5_000)
            ))
        );
    }

    #[test]
    fn test_rejects_invalid_values() {
        let zero_limit = parse("mode = \"stream\"\nimport_limit = 0").validate();
        assert_eq!(zero_limit.unwrap_err(), SettingsError::Zero("import_limit"));

        let collision = parse("mode = \"stream\"\nfield_wrapper = \"|\"").validate();
        assert!(matches!(
            collision.unwrap_err(),
            SettingsError::WrapperCollision(_)
        ));

        let encoding = parse("mode = \"stream\"\nencoding = \"ebcdic\"").validate();
        assert!(matches!(encoding.unwrap_err(), SettingsError::Encoding(_)));
    }
}
