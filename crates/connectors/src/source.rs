use crate::error::SourceError;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use model::{
    metadata::column::{ColumnMetadata, TargetColumn},
    records::row::Row,
};

/// Lazy, single-pass sequence of rows for one table.
pub type RowStream = BoxStream<'static, Result<Row, SourceError>>;

/// A relational database rows are migrated from.
#[async_trait]
pub trait SourceDatabase: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>, SourceError>;

    /// Columns of `table` in ordinal order.
    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnMetadata>, SourceError>;

    /// Opens a new cursor over every row of `table`. Each call starts from the first row.
    async fn open_row_stream(&self, table: &str) -> Result<RowStream, SourceError>;

    /// Maps a source column onto the type the target declares for it.
    fn target_column(&self, column: &ColumnMetadata) -> Result<TargetColumn, SourceError>;
}
