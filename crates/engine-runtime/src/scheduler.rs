use crate::{
    error::MigrationError,
    policy::FailurePolicy,
    report::MigrationReport,
    selection::select_tables,
};
use chrono::Utc;
use engine_processing::{
    MigrationContext, MigrationTask, TableMigrator, TableSummary, error::TableError,
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::Semaphore,
    task::{Id, JoinError, JoinSet},
    time::Instant,
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Final state of one table task.
struct TableOutcome {
    table: String,
    attempts: usize,
    result: Result<TableSummary, TableError>,
}

/// Runs table migrations concurrently under the configured import limit.
///
/// At most `import_limit` tables hold a permit at any instant. A permit is
/// taken per attempt and released before the failure policy runs, so a table
/// waiting to be retried never blocks the others.
pub struct MigrationScheduler {
    migrator: TableMigrator,
    permits: Arc<Semaphore>,
    shutdown_grace: Duration,
}

impl MigrationScheduler {
    pub fn new(ctx: MigrationContext) -> Self {
        let permits = Arc::new(Semaphore::new(ctx.settings.import_limit.get()));
        let shutdown_grace = ctx.settings.shutdown_grace;

        Self {
            migrator: TableMigrator::new(ctx),
            permits,
            shutdown_grace,
        }
    }

    pub fn context(&self) -> &MigrationContext {
        self.migrator.context()
    }

    /// Tables selected by the configured include and exclude patterns.
    pub async fn selected_tables(&self) -> Result<Vec<String>, MigrationError> {
        let settings = &self.context().settings;
        self.select(
            settings.include_tables.as_deref(),
            settings.exclude_tables.as_deref(),
        )
        .await
    }

    /// Migrates with the patterns and failure policy from the settings.
    pub async fn run(&self, cancel: CancellationToken) -> Result<MigrationReport, MigrationError> {
        let settings = self.context().settings.clone();
        self.migrate(
            settings.include_tables.as_deref(),
            settings.exclude_tables.as_deref(),
            FailurePolicy::from(&settings.failure_policy),
            cancel,
        )
        .await
    }

    /// Migrates every selected table and returns once each has reached a
    /// terminal state.
    pub async fn migrate(
        &self,
        include: Option<&[String]>,
        exclude: Option<&[String]>,
        policy: FailurePolicy,
        cancel: CancellationToken,
    ) -> Result<MigrationReport, MigrationError> {
        let mut report = MigrationReport::new(Utc::now());
        let tables = self.select(include, exclude).await?;
        info!(count = tables.len(), tables = %tables.join(", "), "Tables to be imported");

        let run = cancel.child_token();
        let mut tasks = JoinSet::new();
        let mut names: HashMap<Id, String> = HashMap::new();

        for table in tables {
            let span = info_span!("table", table = %table);
            let job = run_table(
                self.migrator.clone(),
                self.permits.clone(),
                policy.clone(),
                table.clone(),
                run.child_token(),
            );
            let handle = tasks.spawn(job.instrument(span));
            names.insert(handle.id(), table);
        }

        let mut abort: Option<(String, TableError)> = None;
        let mut crashed: Option<(String, JoinError)> = None;
        let mut deadline: Option<Instant> = None;

        loop {
            let joined = match deadline {
                None => tokio::select! {
                    joined = tasks.join_next() => joined,
                    _ = run.cancelled() => {
                        info!(pending = tasks.len(), "Cancellation requested, waiting for tables to stop");
                        deadline = Some(Instant::now() + self.shutdown_grace);
                        continue;
                    }
                },
                Some(at) => match tokio::time::timeout_at(at, tasks.join_next()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!(
                            pending = tasks.len(),
                            grace_secs = self.shutdown_grace.as_secs(),
                            "Ignoring tables that did not stop within the shutdown grace period"
                        );
                        tasks.abort_all();
                        while tasks.join_next().await.is_some() {}
                        break;
                    }
                },
            };

            let Some(joined) = joined else {
                break;
            };
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(err) => {
                    // A panicked table stops the run like an abort, through the grace path.
                    let table = names.remove(&err.id()).unwrap_or_default();
                    error!(%table, error = %err, "Table task panicked, stopping migration");
                    self.context().metrics.table_failed();
                    run.cancel();
                    if crashed.is_none() {
                        crashed = Some((table, err));
                    }
                    continue;
                }
            };

            match outcome.result {
                Ok(summary) => report.record_success(summary, outcome.attempts),
                Err(err) if err.is_cancelled() => {
                    debug!(table = %outcome.table, "Table cancelled");
                    report.cancelled.push(outcome.table);
                }
                Err(err) => {
                    self.context().metrics.table_failed();
                    match &policy {
                        FailurePolicy::Abort => {
                            error!(table = %outcome.table, chunk = ?err.chunk(), error = %err, "Failed to import table, aborting migration");
                            if abort.is_none() {
                                run.cancel();
                                abort = Some((outcome.table, err));
                            }
                        }
                        FailurePolicy::Continue | FailurePolicy::Retry(_) => {
                            warn!(table = %outcome.table, chunk = ?err.chunk(), attempts = outcome.attempts, error = %err, "Skipping failed table");
                            report.record_failure(&outcome.table, &err, outcome.attempts);
                        }
                    }
                }
            }
        }

        report.finished_at = Utc::now();
        report.metrics = self.context().metrics.snapshot();

        if let Some((table, source)) = crashed {
            return Err(MigrationError::TablePanicked { table, source });
        }
        if let Some((table, source)) = abort {
            return Err(MigrationError::Aborted { table, source });
        }
        if cancel.is_cancelled() {
            warn!(
                imported = report.imported.len(),
                cancelled = report.cancelled.len(),
                "Migration cancelled"
            );
            return Err(MigrationError::Cancelled);
        }

        info!(
            imported = report.imported.len(),
            failed = report.failed.len(),
            rows = report.metrics.rows_imported,
            "Migration finished"
        );
        Ok(report)
    }

    async fn select(
        &self,
        include: Option<&[String]>,
        exclude: Option<&[String]>,
    ) -> Result<Vec<String>, MigrationError> {
        let tables = self.context().source.list_tables().await?;
        Ok(select_tables(&tables, include, exclude))
    }
}

/// Attempts one table until it succeeds, is cancelled, or the policy gives up.
async fn run_table(
    migrator: TableMigrator,
    permits: Arc<Semaphore>,
    policy: FailurePolicy,
    table: String,
    cancel: CancellationToken,
) -> TableOutcome {
    let mut attempts = 0;

    loop {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            permit = permits.clone().acquire_owned() => permit.ok(),
        };
        let Some(permit) = permit else {
            return TableOutcome {
                table,
                attempts,
                result: Err(TableError::Cancelled),
            };
        };

        attempts += 1;
        let result = attempt(&migrator, &table, &cancel).await;
        drop(permit);

        let err = match result {
            Ok(summary) => {
                return TableOutcome {
                    table,
                    attempts,
                    result: Ok(summary),
                };
            }
            Err(err) => err,
        };

        if let FailurePolicy::Retry(handler) = &policy
            && !err.is_cancelled()
        {
            warn!(attempt = attempts, error = %err, "Table attempt failed");
            let retry = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                retry = handler.should_retry(&table, &err, attempts) => retry,
            };
            if retry {
                migrator.context().metrics.retry_scheduled();
                info!(attempt = attempts + 1, "Retrying table");
                continue;
            }
        }

        return TableOutcome {
            table,
            attempts,
            result: Err(err),
        };
    }
}

async fn attempt(
    migrator: &TableMigrator,
    table: &str,
    cancel: &CancellationToken,
) -> Result<TableSummary, TableError> {
    let task = MigrationTask::open(migrator.context().source.as_ref(), table).await?;
    migrator.migrate(task, cancel).await
}
