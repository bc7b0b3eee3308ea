use crate::error::TargetError;
use async_trait::async_trait;

pub mod command;
pub mod http;

pub use command::{LoadCommand, LoadMethod, TableCommand};
pub use http::HttpTarget;

/// The analytical database rows are loaded into.
///
/// Implementations must accept concurrent submissions: every in-flight table
/// issues its own commands without coordinating with the others.
#[async_trait]
pub trait LoadTarget: Send + Sync {
    async fn execute(&self, command: &str) -> Result<(), TargetError>;
}
