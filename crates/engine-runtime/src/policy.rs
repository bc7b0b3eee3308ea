use async_trait::async_trait;
use engine_core::{
    retry::{RetryDisposition, RetryPolicy},
    settings::FailurePolicyKind,
};
use engine_processing::{error::TableError, retry::classify_table_error};
use std::{fmt, sync::Arc};
use tracing::info;

/// Decides whether a failed table is attempted again.
///
/// Called after the table's concurrency permit has been released, so a
/// handler may wait before answering without holding back other tables.
#[async_trait]
pub trait RetryHandler: Send + Sync {
    /// `attempt` is the number of attempts made so far, starting at 1.
    async fn should_retry(&self, table: &str, error: &TableError, attempt: usize) -> bool;
}

#[async_trait]
impl<F> RetryHandler for F
where
    F: Fn(&str, &TableError, usize) -> bool + Send + Sync,
{
    async fn should_retry(&self, table: &str, error: &TableError, attempt: usize) -> bool {
        self(table, error, attempt)
    }
}

/// Retries transient failures with exponential backoff until the attempt
/// budget is spent.
#[derive(Debug, Clone)]
pub struct BackoffRetry {
    policy: RetryPolicy,
}

impl BackoffRetry {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl RetryHandler for BackoffRetry {
    async fn should_retry(&self, _table: &str, error: &TableError, attempt: usize) -> bool {
        if classify_table_error(error) == RetryDisposition::Stop
            || !self.policy.allows_another(attempt)
        {
            return false;
        }

        let delay = self.policy.backoff_delay(attempt);
        info!(attempt, delay_ms = delay.as_millis(), "Backing off before retrying table");
        tokio::time::sleep(delay).await;
        true
    }
}

/// How the scheduler reacts to a table that failed.
#[derive(Clone, Default)]
pub enum FailurePolicy {
    /// Cancel every other table and fail the run.
    #[default]
    Abort,
    /// Record the failure and carry on with the other tables.
    Continue,
    /// Ask the handler; a table it declines is recorded like `Continue`.
    Retry(Arc<dyn RetryHandler>),
}

impl FailurePolicy {
    pub fn retry_with(handler: impl RetryHandler + 'static) -> Self {
        FailurePolicy::Retry(Arc::new(handler))
    }
}

impl fmt::Debug for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Abort => f.write_str("Abort"),
            FailurePolicy::Continue => f.write_str("Continue"),
            FailurePolicy::Retry(_) => f.write_str("Retry(..)"),
        }
    }
}

impl From<&FailurePolicyKind> for FailurePolicy {
    fn from(kind: &FailurePolicyKind) -> Self {
        match kind {
            FailurePolicyKind::Abort => FailurePolicy::Abort,
            FailurePolicyKind::Continue => FailurePolicy::Continue,
            FailurePolicyKind::Retry(policy) => {
                FailurePolicy::retry_with(BackoffRetry::new(policy.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::error::TargetError;
    use std::time::Duration;

    fn transient() -> TableError {
        TableError::LoadDispatch {
            chunk: 0,
            source: TargetError::Rejected {
                status: 503,
                message: "busy".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_backoff_retry_respects_budget() {
        let handler = BackoffRetry::new(RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(2)));

        assert!(handler.should_retry("users", &transient(), 1).await);
        assert!(!handler.should_retry("users", &transient(), 2).await);
    }

    #[tokio::test]
    async fn test_backoff_retry_skips_fatal_errors() {
        let handler = BackoffRetry::new(RetryPolicy::default());
        let fatal = TableError::Format(model::error::FormatError::UnsupportedEncoding("x".into()));

        assert!(!handler.should_retry("users", &fatal, 1).await);
    }

    #[tokio::test]
    async fn test_closures_are_handlers() {
        let handler = |table: &str, _: &TableError, attempt: usize| table == "users" && attempt < 3;

        assert!(handler.should_retry("users", &transient(), 1).await);
        assert!(!handler.should_retry("orders", &transient(), 1).await);
    }
}
