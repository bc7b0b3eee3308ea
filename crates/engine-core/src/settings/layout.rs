use model::records::chunk::ChunkDescriptor;
use std::path::PathBuf;

/// Derives chunk file names and the paths load commands refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLayout {
    /// Local directory chunk files are written under.
    pub upload_folder: PathBuf,
    /// Folder prefix of the path as seen by the target.
    pub user_folder: Option<String>,
    pub file_extension: Option<String>,
}

impl ChunkLayout {
    pub fn new(
        upload_folder: impl Into<PathBuf>,
        user: Option<&str>,
        user_folder: Option<String>,
        file_extension: Option<String>,
    ) -> Self {
        let mut upload_folder = upload_folder.into();
        if let Some(user) = user {
            upload_folder.push(user);
        }

        Self {
            upload_folder,
            user_folder,
            file_extension,
        }
    }

    pub fn file_name(&self, table: &str, index: usize) -> String {
        match &self.file_extension {
            Some(ext) => format!("{table}_{index}.{ext}"),
            None => format!("{table}_{index}"),
        }
    }

    /// Path of the chunk as written into the load command.
    pub fn reference_path(&self, table: &str, index: usize) -> String {
        let file_name = self.file_name(table, index);
        match &self.user_folder {
            Some(folder) => format!("{}/{file_name}", folder.trim_end_matches('/')),
            None => file_name,
        }
    }

    pub fn descriptor(&self, table: &str, index: usize) -> ChunkDescriptor {
        let reference_path = self.reference_path(table, index);
        ChunkDescriptor {
            table: table.to_string(),
            index,
            file_path: self.upload_folder.join(&reference_path),
            reference_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_with_user_folder() {
        let layout = ChunkLayout::new(
            "/srv/uploads",
            Some("alice"),
            Some("2".to_string()),
            Some("dat".to_string()),
        );
        let chunk = layout.descriptor("orders", 7);

        assert_eq!(chunk.reference_path, "2/orders_7.dat");
        assert_eq!(chunk.file_path, PathBuf::from("/srv/uploads/alice/2/orders_7.dat"));
        assert_eq!(chunk.index, 7);
    }

    #[test]
    fn test_descriptor_without_extension_or_folder() {
        let layout = ChunkLayout::new("/tmp/up", None, None, None);
        let chunk = layout.descriptor("orders", 0);

        assert_eq!(chunk.reference_path, "orders_0");
        assert_eq!(chunk.file_path, PathBuf::from("/tmp/up/orders_0"));
    }
}
