use serde::Serialize;
use std::path::PathBuf;

/// Identifies one persisted batch of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkDescriptor {
    pub table: String,
    pub index: usize,
    /// Where the chunk is written locally.
    pub file_path: PathBuf,
    /// How the load command refers to the chunk.
    pub reference_path: String,
}
