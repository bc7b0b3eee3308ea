use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Turns SIGINT and SIGTERM into a graceful stop of the migration run.
///
/// The first signal cancels the run token. Tables stop before their next
/// batch, loaders before their next chunk, and the scheduler gives in-flight
/// work the configured grace period. A second signal exits immediately.
#[derive(Default)]
pub struct ShutdownCoordinator {
    run: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token handed to the scheduler.
    pub fn run_token(&self) -> CancellationToken {
        self.run.clone()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.run.is_cancelled()
    }

    /// Starts listening for shutdown signals for a run that waits up to
    /// `grace` for its tables once stopped.
    pub fn listen(&self, grace: Duration) {
        let run = self.run.clone();

        tokio::spawn(async move {
            let first = next_signal().await;
            info!(
                signal = first,
                grace_secs = grace.as_secs(),
                "Stopping migration, waiting for in-flight tables"
            );
            run.cancel();

            let second = next_signal().await;
            warn!(signal = second, "Second shutdown signal, exiting without waiting");
            std::process::exit(ExitCode::ShutdownRequested.as_i32());
        });
    }
}

async fn next_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

/// Process exit codes of `blaze-migrate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Conventional code for termination by SIGINT.
    ShutdownRequested = 130,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_run_counts_as_shutdown() {
        let shutdown = ShutdownCoordinator::new();
        assert!(!shutdown.is_shutdown_requested());

        shutdown.run_token().cancel();
        assert!(shutdown.is_shutdown_requested());
        assert_eq!(ExitCode::ShutdownRequested.as_i32(), 130);
    }
}
