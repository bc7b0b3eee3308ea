pub mod batch;
pub mod context;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod retry;
pub mod stages;
pub mod table;

pub use context::MigrationContext;
pub use table::{MigrationTask, TableMigrator, TableSummary};
