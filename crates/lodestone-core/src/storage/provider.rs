use std::fmt::Debug;
use std::path::{Path, PathBuf};
use crate::storage::error::Result;

/// Trait for storage providers that can read and write data.
///
/// All paths handed to a provider are relative to its root; `full_path`
/// resolves them to absolute paths for collaborators that bypass the
/// provider (the embedded database engine opens its own file handle).
pub trait StorageProvider: Send + Sync + Debug {
    /// Get the name of this provider
    fn name(&self) -> &str;

    /// Resolve a provider-relative path to an absolute path
    fn full_path(&self, path: &Path) -> PathBuf;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if a path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Create a directory and all its parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Read a file to a string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Read a file to a vector of bytes
    fn read_to_bytes(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write a string to a file
    fn write_string(&self, path: &Path, contents: &str) -> Result<()>;

    /// Write bytes to a file
    fn write_bytes(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Remove a file
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// List all entries in a directory
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}
