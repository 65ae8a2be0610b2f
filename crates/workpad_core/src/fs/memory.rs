//! In-memory filesystem implementation for tests and browser targets.

use std::collections::HashMap;
use std::io::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use super::FileSystem;

/// In-memory filesystem backed by a `HashMap`.
///
/// Cloning shares the underlying storage, so a test can hand one clone to
/// the code under test and inspect the other. Data is lost when the last
/// clone drops.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileSystem {
    files: Arc<RwLock<HashMap<PathBuf, String>>>,
}

impl InMemoryFileSystem {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files currently stored.
    pub fn file_count(&self) -> usize {
        self.files.read().unwrap().len()
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.files.read().unwrap();
        files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("no such file: {:?}", path)))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let mut files = self.files.write().unwrap();
        files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        let mut files = self.files.write().unwrap();
        files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("no such file: {:?}", path)))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
    }

    fn create_dir_all(&self, _path: &Path) -> Result<()> {
        // Directories are implicit in the flat map
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let files = self.files.read().unwrap();
        let mut result: Vec<PathBuf> = files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect();
        result.sort();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_delete() {
        let fs = InMemoryFileSystem::new();
        let path = Path::new("dir/file.json");

        assert!(!fs.exists(path));
        fs.write_file(path, "{}").unwrap();
        assert!(fs.exists(path));
        assert_eq!(fs.read_to_string(path).unwrap(), "{}");

        fs.delete_file(path).unwrap();
        assert!(!fs.exists(path));
        assert!(fs.read_to_string(path).is_err());
    }

    #[test]
    fn test_clones_share_storage() {
        let fs = InMemoryFileSystem::new();
        let clone = fs.clone();

        fs.write_file(Path::new("a.json"), "1").unwrap();
        assert_eq!(clone.read_to_string(Path::new("a.json")).unwrap(), "1");
    }

    #[test]
    fn test_list_files_only_direct_children() {
        let fs = InMemoryFileSystem::new();
        fs.write_file(Path::new("data/a.json"), "").unwrap();
        fs.write_file(Path::new("data/b.json"), "").unwrap();
        fs.write_file(Path::new("data/sub/c.json"), "").unwrap();

        let listed = fs.list_files(Path::new("data")).unwrap();
        assert_eq!(
            listed,
            vec![PathBuf::from("data/a.json"), PathBuf::from("data/b.json")]
        );
    }
}
