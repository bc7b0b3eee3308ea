use connectors::error::SourceError;
use engine_core::settings::SettingsError;
use engine_runtime::error::MigrationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read the configuration file: {0}")]
    ConfigFileRead(#[from] std::io::Error),

    #[error("Failed to parse the configuration file as TOML: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid import settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to connect to the source: {0}")]
    Source(#[from] SourceError),

    #[error("Failed to run the migration: {0}")]
    Runner(#[from] MigrationError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("{0} table(s) failed to import")]
    TablesFailed(usize),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
