use crate::{error::TableError, format::RowFormatter};
use connectors::source::RowStream;
use futures::StreamExt;
use model::records::batch::Batch;
use std::num::NonZeroUsize;
use tracing::warn;

/// A formatted row held back because it closed the previous batch.
#[derive(Debug)]
struct PendingLine {
    line: String,
    bytes: usize,
}

/// Accumulates rows from a single-pass stream into batches.
///
/// The row that closes a batch is kept as lookahead and opens the next one,
/// whichever bound the next call uses, so batches concatenate to exactly the
/// source sequence. An empty batch is returned only once the stream is
/// exhausted.
pub struct BatchBuilder {
    rows: RowStream,
    formatter: RowFormatter,
    pending: Option<PendingLine>,
    exhausted: bool,
    rows_read: u64,
}

impl BatchBuilder {
    pub fn new(rows: RowStream, formatter: RowFormatter) -> Self {
        Self {
            rows,
            formatter,
            pending: None,
            exhausted: false,
            rows_read: 0,
        }
    }

    /// Rows pulled from the stream so far, lookahead included.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Collects up to `limit` rows.
    pub async fn read_by_count(&mut self, limit: NonZeroUsize) -> Result<Batch, TableError> {
        self.build(|batch, _| batch.len() >= limit.get()).await
    }

    /// Collects rows while their cumulative encoded size stays within
    /// `max_size`. A first row that alone exceeds the bound is emitted as a
    /// batch of its own.
    pub async fn read_by_bytes(&mut self, max_size: usize) -> Result<Batch, TableError> {
        let batch = self
            .build(|batch, bytes| batch.byte_size() + bytes > max_size)
            .await?;

        if batch.len() == 1 && batch.byte_size() > max_size {
            warn!(
                bytes = batch.byte_size(),
                limit = max_size,
                "Row exceeds the batch byte limit and is sent on its own"
            );
        }

        Ok(batch)
    }

    /// Adds lines until `is_full(batch, next_bytes)` holds for the next line.
    /// The first line of a batch is always taken.
    async fn build<F>(&mut self, is_full: F) -> Result<Batch, TableError>
    where
        F: Fn(&Batch, usize) -> bool,
    {
        let mut batch = Batch::new();

        while let Some(next) = self.next_line().await? {
            if !batch.is_empty() && is_full(&batch, next.bytes) {
                self.pending = Some(next);
                break;
            }
            batch.push(next.line, next.bytes);
        }

        Ok(batch)
    }

    async fn next_line(&mut self) -> Result<Option<PendingLine>, TableError> {
        if let Some(pending) = self.pending.take() {
            return Ok(Some(pending));
        }
        if self.exhausted {
            return Ok(None);
        }

        match self.rows.next().await {
            Some(row) => {
                let line = self.formatter.format(row?);
                let bytes = self.formatter.encoded_len(&line)?;
                self.rows_read += 1;
                Ok(Some(PendingLine { line, bytes }))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }
}
