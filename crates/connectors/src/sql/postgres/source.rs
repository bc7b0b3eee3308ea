use crate::{
    error::SourceError,
    source::{RowStream, SourceDatabase},
    sql::postgres::{
        typemap::{self, PgTypeMapping, ReadAs},
        utils::{connect_client, quote_ident},
    },
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures_util::StreamExt;
use model::{
    core::value::Value,
    metadata::column::{ColumnMetadata, TargetColumn},
    records::row::Row,
};
use std::sync::Arc;
use tokio_postgres::{Client, Row as PgRow};
use tracing::debug;

const LIST_TABLES_SQL: &str = "SELECT DISTINCT table_name::text \
     FROM information_schema.tables \
     WHERE table_schema = $1 AND table_type = 'BASE TABLE' \
     ORDER BY 1";

const LIST_COLUMNS_SQL: &str = "SELECT column_name::text, data_type::text, \
     character_maximum_length::integer \
     FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2 \
     ORDER BY ordinal_position";

/// Reads tables of one Postgres schema.
///
/// Catalog queries share one client. Every row stream opens its own
/// connection: a client answers requests in order, so a stream that is read
/// slowly would otherwise hold up every other table.
#[derive(Clone)]
pub struct PgSource {
    url: String,
    client: Arc<Client>,
    schema: String,
}

impl PgSource {
    pub async fn connect(url: &str, schema: impl Into<String>) -> Result<Self, SourceError> {
        let client = connect_client(url).await?;
        Ok(Self {
            url: url.to_string(),
            client: Arc::new(client),
            schema: schema.into(),
        })
    }

    fn mapping_for(column: &ColumnMetadata) -> Result<PgTypeMapping, SourceError> {
        typemap::lookup(&column.data_type).ok_or_else(|| SourceError::UnsupportedType {
            column: column.name.clone(),
            data_type: column.data_type.clone(),
        })
    }
}

fn select_sql(schema: &str, table: &str, columns: &[(ColumnMetadata, PgTypeMapping)]) -> String {
    let select_list = columns
        .iter()
        .map(|(col, mapping)| match mapping.cast {
            Some(cast) => format!("{}::{cast}", quote_ident(&col.name)),
            None => quote_ident(&col.name),
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT {select_list} FROM {}.{}",
        quote_ident(schema),
        quote_ident(table)
    )
}

#[async_trait]
impl SourceDatabase for PgSource {
    async fn list_tables(&self) -> Result<Vec<String>, SourceError> {
        let rows = self.client.query(LIST_TABLES_SQL, &[&self.schema]).await?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(SourceError::from))
            .collect()
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnMetadata>, SourceError> {
        let rows = self
            .client
            .query(LIST_COLUMNS_SQL, &[&self.schema, &table])
            .await?;

        rows.iter()
            .map(|row| -> Result<ColumnMetadata, SourceError> {
                Ok(ColumnMetadata {
                    name: row.try_get(0)?,
                    data_type: row.try_get(1)?,
                    max_length: row.try_get(2)?,
                })
            })
            .collect()
    }

    async fn open_row_stream(&self, table: &str) -> Result<RowStream, SourceError> {
        let columns = self.list_columns(table).await?;
        if columns.is_empty() {
            return Err(SourceError::TableNotFound(table.to_string()));
        }

        let columns = columns
            .into_iter()
            .map(|col| Self::mapping_for(&col).map(|m| (col, m)))
            .collect::<Result<Vec<_>, _>>()?;

        let sql = select_sql(&self.schema, table, &columns);
        debug!(%table, %sql, "Opening row stream");

        let client = connect_client(&self.url).await?;
        let params: [&str; 0] = [];
        let rows = client.query_raw(sql.as_str(), params).await?;
        let kinds: Arc<[ReadAs]> = columns.iter().map(|(_, m)| m.read_as).collect();

        // The connection lives as long as the stream.
        let stream = rows.map(move |res| {
            let _client = &client;
            let row = res?;
            convert_row(&row, &kinds)
        });

        Ok(stream.boxed())
    }

    fn target_column(&self, column: &ColumnMetadata) -> Result<TargetColumn, SourceError> {
        let mapping = Self::mapping_for(column)?;
        Ok(TargetColumn {
            name: column.name.clone(),
            target_type: mapping.target.render(column.max_length),
        })
    }
}

fn convert_row(row: &PgRow, kinds: &[ReadAs]) -> Result<Row, SourceError> {
    let mut values = Vec::with_capacity(kinds.len());
    for (idx, kind) in kinds.iter().enumerate() {
        values.push(read_value(row, idx, *kind)?);
    }
    Ok(Row::new(values))
}

fn read_value(row: &PgRow, idx: usize, kind: ReadAs) -> Result<Value, SourceError> {
    let value = match kind {
        ReadAs::Int2 => row.try_get::<_, Option<i16>>(idx)?.map(|v| Value::Int(v as i64)),
        ReadAs::Int4 => row.try_get::<_, Option<i32>>(idx)?.map(|v| Value::Int(v as i64)),
        ReadAs::Int8 => row.try_get::<_, Option<i64>>(idx)?.map(Value::Int),
        ReadAs::Float4 => row.try_get::<_, Option<f32>>(idx)?.map(Value::Real),
        ReadAs::Float8 => row.try_get::<_, Option<f64>>(idx)?.map(Value::Float),
        ReadAs::Numeric => row.try_get::<_, Option<String>>(idx)?.map(Value::Numeric),
        ReadAs::Text => row.try_get::<_, Option<String>>(idx)?.map(Value::String),
        ReadAs::Date => row.try_get::<_, Option<NaiveDate>>(idx)?.map(Value::Date),
        ReadAs::Timestamp => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(Value::Timestamp),
        ReadAs::TimestampTz => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(Value::TimestampTz),
    };

    Ok(value.unwrap_or(Value::Null))
}
