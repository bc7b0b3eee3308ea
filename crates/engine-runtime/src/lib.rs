pub mod error;
pub mod policy;
pub mod report;
pub mod scheduler;
pub mod selection;


pub use error::MigrationError;
pub use policy::{BackoffRetry, FailurePolicy, RetryHandler};
pub use report::MigrationReport;
pub use scheduler::MigrationScheduler;
