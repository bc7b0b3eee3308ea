use crate::error::TableError;
use connectors::error::{SourceError, TargetError};
use engine_core::retry::RetryDisposition;
use tokio_postgres::{Error as PgError, error::SqlState};

/// Whether a failed table attempt is worth repeating.
pub fn classify_table_error(err: &TableError) -> RetryDisposition {
    match err {
        TableError::SourceRead(source_err) => classify_source_error(source_err),
        TableError::Write { .. } => RetryDisposition::Retry,
        TableError::LoadDispatch { source, .. } | TableError::Stage { source, .. } => {
            classify_target_error(source)
        }
        TableError::Format(_) => RetryDisposition::Stop,
        TableError::LoaderJoin(_) => RetryDisposition::Stop,
        TableError::Cancelled => RetryDisposition::Stop,
    }
}

pub fn classify_source_error(err: &SourceError) -> RetryDisposition {
    match err {
        SourceError::Postgres(pg_err) => classify_pg_error(pg_err),
        SourceError::TlsConfig(_) => RetryDisposition::Retry,
        SourceError::InvalidUrl(_) => RetryDisposition::Stop,
        SourceError::TableNotFound(_) => RetryDisposition::Stop,
        SourceError::UnsupportedType { .. } => RetryDisposition::Stop,
        SourceError::Other(_) => RetryDisposition::Stop,
    }
}

pub fn classify_target_error(err: &TargetError) -> RetryDisposition {
    match err {
        TargetError::Http(http_err) => {
            if http_err.is_timeout() || http_err.is_connect() || http_err.is_request() {
                RetryDisposition::Retry
            } else {
                RetryDisposition::Stop
            }
        }
        TargetError::Rejected { status, .. } => {
            if *status == 429 || *status >= 500 {
                RetryDisposition::Retry
            } else {
                RetryDisposition::Stop
            }
        }
    }
}

fn classify_pg_error(err: &PgError) -> RetryDisposition {
    if err.is_closed() {
        return RetryDisposition::Retry;
    }

    if let Some(code) = err.code()
        && is_retryable_pg_code(code)
    {
        return RetryDisposition::Retry;
    }

    RetryDisposition::Stop
}

fn is_retryable_pg_code(code: &SqlState) -> bool {
    matches!(
        *code,
        SqlState::T_R_SERIALIZATION_FAILURE
            | SqlState::T_R_DEADLOCK_DETECTED
            | SqlState::TOO_MANY_CONNECTIONS
            | SqlState::ADMIN_SHUTDOWN
            | SqlState::CANNOT_CONNECT_NOW
            | SqlState::CONNECTION_FAILURE
            | SqlState::CONNECTION_EXCEPTION
            | SqlState::QUERY_CANCELED
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_side_rejections_are_transient() {
        let busy = TableError::LoadDispatch {
            chunk: 2,
            source: TargetError::Rejected {
                status: 503,
                message: "busy".to_string(),
            },
        };
        let bad = TableError::LoadDispatch {
            chunk: 2,
            source: TargetError::Rejected {
                status: 400,
                message: "syntax".to_string(),
            },
        };

        assert_eq!(classify_table_error(&busy), RetryDisposition::Retry);
        assert_eq!(classify_table_error(&bad), RetryDisposition::Stop);
    }

    #[test]
    fn test_schema_mismatches_are_fatal() {
        let err = TableError::SourceRead(SourceError::UnsupportedType {
            column: "shape".to_string(),
            data_type: "polygon".to_string(),
        });

        assert_eq!(classify_table_error(&err), RetryDisposition::Stop);
        assert_eq!(classify_table_error(&TableError::Cancelled), RetryDisposition::Stop);
    }
}
