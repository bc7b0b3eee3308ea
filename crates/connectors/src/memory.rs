//! In-memory source and target, used by tests across the workspace.

use crate::{
    error::{SourceError, TargetError},
    source::{RowStream, SourceDatabase},
    target::LoadTarget,
};
use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use model::{
    metadata::column::{ColumnMetadata, TargetColumn},
    records::row::Row,
};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
    time::Duration,
};

#[derive(Debug, Clone, Default)]
struct MemoryTable {
    columns: Vec<ColumnMetadata>,
    rows: Vec<Row>,
    /// Index of the row whose read fails, if any.
    fail_at: Option<usize>,
}

/// Source backed by rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: BTreeMap<String, MemoryTable>,
    row_delay: Option<Duration>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(
        mut self,
        name: impl Into<String>,
        columns: Vec<ColumnMetadata>,
        rows: Vec<Row>,
    ) -> Self {
        self.tables.insert(
            name.into(),
            MemoryTable {
                columns,
                rows,
                fail_at: None,
            },
        );
        self
    }

    /// Makes the stream of `table` fail when it reaches row `index`.
    pub fn failing_at(mut self, table: &str, index: usize) -> Self {
        if let Some(t) = self.tables.get_mut(table) {
            t.fail_at = Some(index);
        }
        self
    }

    /// Suspends before yielding every row.
    pub fn with_row_delay(mut self, delay: Duration) -> Self {
        self.row_delay = Some(delay);
        self
    }

    fn table(&self, name: &str) -> Result<&MemoryTable, SourceError> {
        self.tables
            .get(name)
            .ok_or_else(|| SourceError::TableNotFound(name.to_string()))
    }
}

#[async_trait]
impl SourceDatabase for MemorySource {
    async fn list_tables(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.tables.keys().cloned().collect())
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnMetadata>, SourceError> {
        Ok(self.table(table)?.columns.clone())
    }

    async fn open_row_stream(&self, table: &str) -> Result<RowStream, SourceError> {
        let t = self.table(table)?;
        let fail_at = t.fail_at;
        let delay = self.row_delay;
        let name = table.to_string();

        let rows = t.rows.clone().into_iter().enumerate();
        let stream = stream::iter(rows).then(move |(idx, row)| {
            let name = name.clone();
            async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                if fail_at == Some(idx) {
                    return Err(SourceError::Other(format!(
                        "read of row {idx} from '{name}' failed"
                    )));
                }
                Ok(row)
            }
        });

        Ok(stream.boxed())
    }

    fn target_column(&self, column: &ColumnMetadata) -> Result<TargetColumn, SourceError> {
        Ok(TargetColumn {
            name: column.name.clone(),
            target_type: column.data_type.clone(),
        })
    }
}

#[derive(Debug, Default)]
struct TargetState {
    commands: Vec<String>,
    in_flight: usize,
    max_in_flight: usize,
    /// Remaining transient failures per command fragment.
    flaky: HashMap<String, usize>,
}

/// Target that records every command it receives.
#[derive(Debug, Clone, Default)]
pub struct MemoryTarget {
    state: Arc<Mutex<TargetState>>,
    delay: Option<Duration>,
    /// Commands containing one of these fragments are rejected.
    reject: Arc<Vec<String>>,
    per_table_delay: Arc<HashMap<String, Duration>>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delays commands that load into `table`.
    pub fn with_table_delay(mut self, table: &str, delay: Duration) -> Self {
        Arc::make_mut(&mut self.per_table_delay).insert(table.to_string(), delay);
        self
    }

    pub fn rejecting(mut self, fragment: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.reject).push(fragment.into());
        self
    }

    /// Fails the first `times` commands containing `fragment` with a 503.
    pub fn flaky(self, fragment: impl Into<String>, times: usize) -> Self {
        self.lock().flaky.insert(fragment.into(), times);
        self
    }

    /// Commands received so far, in arrival order.
    pub fn commands(&self) -> Vec<String> {
        self.lock().commands.clone()
    }

    /// Highest number of commands that were executing at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.lock().max_in_flight
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TargetState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn delay_for(&self, command: &str) -> Option<Duration> {
        self.per_table_delay
            .iter()
            .find(|(table, _)| command.contains(&format!("into table {table} ")))
            .map(|(_, d)| *d)
            .or(self.delay)
    }
}

#[async_trait]
impl LoadTarget for MemoryTarget {
    async fn execute(&self, command: &str) -> Result<(), TargetError> {
        {
            let mut state = self.lock();
            state.commands.push(command.to_string());
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }

        if let Some(delay) = self.delay_for(command) {
            tokio::time::sleep(delay).await;
        }

        let transient = {
            let mut state = self.lock();
            state.in_flight -= 1;
            state
                .flaky
                .iter_mut()
                .find(|(fragment, left)| **left > 0 && command.contains(fragment.as_str()))
                .map(|(_, left)| *left -= 1)
                .is_some()
        };

        if transient {
            return Err(TargetError::Rejected {
                status: 503,
                message: "target temporarily unavailable".to_string(),
            });
        }

        if self.reject.iter().any(|f| command.contains(f.as_str())) {
            return Err(TargetError::Rejected {
                status: 400,
                message: format!("rejected: {command}"),
            });
        }

        Ok(())
    }
}
