use model::{core::format::TextFormat, metadata::column::TargetColumn};
use std::fmt;

/// Where the rows of a load command come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMethod<'a> {
    /// Rows inlined in the command.
    Stream(&'a str),
    /// Rows read by the target from a chunk file.
    Infile(&'a str),
}

impl fmt::Display for LoadMethod<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadMethod::Stream(payload) => write!(f, "stream '{payload}'"),
            LoadMethod::Infile(path) => write!(f, "infile {path}"),
        }
    }
}

/// `load data ... into table ...` command.
#[derive(Debug, Clone, Copy)]
pub struct LoadCommand<'a> {
    pub table: &'a str,
    pub method: LoadMethod<'a>,
    pub format: &'a TextFormat,
}

impl<'a> LoadCommand<'a> {
    pub fn new(table: &'a str, method: LoadMethod<'a>, format: &'a TextFormat) -> Self {
        Self {
            table,
            method,
            format,
        }
    }
}

impl fmt::Display for LoadCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "load data {} into table {} fields terminated by '{}' enclosed by '{}' lines terminated by '{}'",
            self.method,
            self.table,
            self.format.field_terminator,
            self.format.field_wrapper,
            self.format.line_terminator
        )
    }
}

/// Table-level DDL issued before rows are loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableCommand<'a> {
    Drop { table: &'a str },
    Create { table: &'a str, columns: &'a [TargetColumn] },
}

impl fmt::Display for TableCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableCommand::Drop { table } => write!(f, "drop table {table}"),
            TableCommand::Create { table, columns } => {
                let defs = columns
                    .iter()
                    .map(|c| format!("{} {}", c.name, c.target_type))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "create table {table} ({defs})")
            }
        }
    }
}
