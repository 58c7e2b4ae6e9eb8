use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use crate::storage::error::{Result, StorageError};
use crate::storage::provider::StorageProvider;

/// Local filesystem storage provider
#[derive(Clone)]
pub struct LocalStorageProvider {
    base_path: PathBuf,
}

impl LocalStorageProvider {
    /// Create a new local storage provider with the given base path
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Resolve a relative path against the base path
    fn resolve_path<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.base_path.join(path)
    }
}

impl StorageProvider for LocalStorageProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn full_path(&self, path: &Path) -> PathBuf {
        self.resolve_path(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve_path(path).exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.resolve_path(path).is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve_path(path).is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let full_path = self.resolve_path(path);
        fs::create_dir_all(&full_path)
            .map_err(|e| StorageError::io(e, "create_dir_all", full_path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let full_path = self.resolve_path(path);
        fs::read_to_string(&full_path)
            .map_err(|e| StorageError::io(e, "read_to_string", full_path))
    }

    fn read_to_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        let full_path = self.resolve_path(path);
        fs::read(&full_path).map_err(|e| StorageError::io(e, "read_to_bytes", full_path))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<()> {
        self.write_bytes(path, contents.as_bytes())
    }

    fn write_bytes(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let full_path = self.resolve_path(path);

        let parent = match full_path.parent() {
            Some(parent) => parent,
            None => {
                return Err(StorageError::OperationFailed {
                    operation: "write_bytes".to_string(),
                    path: Some(full_path.clone()),
                    message: "Cannot write to path without parent directory".to_string(),
                });
            }
        };
        if !parent.is_dir() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::io(e, "create_dir_all", parent.to_path_buf()))?;
        }

        // Write to a temporary file in the target directory, then persist it
        // over the destination so readers never observe a partial write.
        let temp_file = NamedTempFile::new_in(parent)
            .map_err(|e| StorageError::io(e, "create_temp_file", parent.to_path_buf()))?;

        temp_file
            .as_file()
            .write_all(contents)
            .map_err(|e| StorageError::io(e, "write_to_temp_file", temp_file.path().to_path_buf()))?;

        temp_file
            .persist(&full_path)
            .map_err(|e| StorageError::io(e.error, "persist_temp_file", full_path.clone()))?;

        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let full_path = self.resolve_path(path);
        fs::remove_file(&full_path).map_err(|e| StorageError::io(e, "remove_file", full_path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let full_path = self.resolve_path(path);
        let entries = fs::read_dir(&full_path)
            .map_err(|e| StorageError::io(e, "read_dir", full_path.clone()))?;
        let mut result = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(e, "read_dir_entry", full_path.clone()))?;
            let path = entry.path();

            // Convert back to a relative path if possible
            if let Ok(rel_path) = path.strip_prefix(&self.base_path) {
                result.push(rel_path.to_path_buf());
            } else {
                result.push(path);
            }
        }

        Ok(result)
    }
}

impl fmt::Debug for LocalStorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStorageProvider")
            .field("base_path", &self.base_path)
            .finish()
    }
}
