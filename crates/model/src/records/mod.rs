pub mod batch;
pub mod chunk;
pub mod row;
