pub mod core;
pub mod error;
pub mod metadata;
pub mod records;
