use async_trait::async_trait;
use std::{io, path::Path};
use tracing::debug;

/// Persists chunk files for file-based loads.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Writes `contents` to `path`, creating or fully overwriting the file.
    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Writes chunks to the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalChunkStore;

#[async_trait]
impl ChunkStore for LocalChunkStore {
    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        debug!(path = %path.display(), bytes = contents.len(), "Writing chunk file");
        tokio::fs::write(path, contents).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_parent_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice").join("users_0.dat");
        let store = LocalChunkStore;

        store.write(&path, b"first").await.unwrap();
        store.write(&path, b"second").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }
}
