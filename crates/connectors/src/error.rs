use thiserror::Error;

/// Errors raised while enumerating or reading a source database.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("TLS configuration error: {0}")]
    TlsConfig(#[from] native_tls::Error),

    #[error("Table '{0}' not found in source")]
    TableNotFound(String),

    #[error("Unsupported type '{data_type}' for column '{column}'")]
    UnsupportedType { column: String, data_type: String },

    #[error("Source error: {0}")]
    Other(String),
}

/// Errors raised by the target while executing a command.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Target rejected command (status {status}): {message}")]
    Rejected { status: u16, message: String },
}
