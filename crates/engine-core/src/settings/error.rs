use model::error::FormatError;
use thiserror::Error;

/// Errors raised when import settings are inconsistent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Setting '{0}' must not be empty")]
    Empty(&'static str),

    #[error("Setting '{0}' must be greater than zero")]
    Zero(&'static str),

    #[error("Field wrapper {0:?} collides with a terminator")]
    WrapperCollision(String),

    #[error("Chunked imports require 'upload_folder'")]
    MissingUploadFolder,

    #[error("Invalid encoding: {0}")]
    Encoding(#[from] FormatError),
}
