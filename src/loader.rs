//! Loader capability for documents and the files they reference.
//!
//! The engine never touches the filesystem directly: it asks a
//! [`DocumentLoader`] for raw bytes. [`FsLoader`] reads from disk with a size
//! bound; [`MemoryLoader`] serves a fixed set of files, which keeps tests and
//! embedders deterministic.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Default upper bound for any loaded file.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// The four distinguishable outcomes of a failed load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("path is a directory: {}", .0.display())]
    IsDirectory(PathBuf),

    #[error("I/O error reading {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl LoadError {
    fn from_io(path: &Path, err: &std::io::Error) -> Self {
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }
}

/// Returns the raw bytes stored at an absolute path.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Vec<u8>, LoadError>;
}

/// Reads files from the local filesystem.
#[derive(Debug, Clone)]
pub struct FsLoader {
    max_bytes: u64,
}

impl Default for FsLoader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_BYTES)
    }
}

impl FsLoader {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

impl DocumentLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<Vec<u8>, LoadError> {
        let metadata = fs::metadata(path).map_err(|e| LoadError::from_io(path, &e))?;
        if metadata.is_dir() {
            return Err(LoadError::IsDirectory(path.to_path_buf()));
        }
        if metadata.len() > self.max_bytes {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                message: format!(
                    "file is {} bytes, limit is {} bytes",
                    metadata.len(),
                    self.max_bytes
                ),
            });
        }
        tracing::trace!("Loading {}", path.display());
        fs::read(path).map_err(|e| LoadError::from_io(path, &e))
    }
}

/// Serves files from memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, Vec<u8>>,
    directories: HashSet<PathBuf>,
    denied: HashSet<PathBuf>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(normalize_path(&path.into()), contents.into());
        self
    }

    pub fn with_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.directories.insert(normalize_path(&path.into()));
        self
    }

    pub fn with_denied(mut self, path: impl Into<PathBuf>) -> Self {
        self.denied.insert(normalize_path(&path.into()));
        self
    }
}

impl DocumentLoader for MemoryLoader {
    fn load(&self, path: &Path) -> Result<Vec<u8>, LoadError> {
        let path = normalize_path(path);
        if self.denied.contains(&path) {
            return Err(LoadError::PermissionDenied(path));
        }
        if self.directories.contains(&path) {
            return Err(LoadError::IsDirectory(path));
        }
        self.files
            .get(&path)
            .cloned()
            .ok_or(LoadError::NotFound(path))
    }
}

/// Lexically resolve `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Make `path` absolute against the current directory, then normalize it.
pub fn absolute_path(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    normalize_path(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c/./d.md")),
            PathBuf::from("/a/c/d.md")
        );
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_fs_loader_outcomes() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("doc.md");
        fs::write(&file, "a: 1\n").unwrap();

        let loader = FsLoader::default();
        assert_eq!(loader.load(&file).unwrap(), b"a: 1\n");
        assert!(matches!(
            loader.load(&dir.path().join("missing.md")),
            Err(LoadError::NotFound(_))
        ));
        assert!(matches!(
            loader.load(dir.path()),
            Err(LoadError::IsDirectory(_))
        ));
    }

    #[test]
    fn test_fs_loader_size_limit() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("big.md");
        fs::write(&file, "x".repeat(64)).unwrap();

        let err = FsLoader::new(16).load(&file).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::new()
            .with_file("/p/a.md", "a: 1\n")
            .with_directory("/p/dir")
            .with_denied("/p/secret.md");
        assert!(loader.load(Path::new("/p/./a.md")).is_ok());
        assert!(matches!(
            loader.load(Path::new("/p/dir")),
            Err(LoadError::IsDirectory(_))
        ));
        assert!(matches!(
            loader.load(Path::new("/p/secret.md")),
            Err(LoadError::PermissionDenied(_))
        ));
        assert!(matches!(
            loader.load(Path::new("/p/none.md")),
            Err(LoadError::NotFound(_))
        ));
    }
}
