pub mod store;

pub use store::{ChunkStore, LocalChunkStore};
