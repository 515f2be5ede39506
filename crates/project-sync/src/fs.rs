//! FileSystem trait abstraction for vault file operations.
//!
//! Implementations:
//! - `InMemoryFs` - For testing
//! - `NativeFs` (in project-notes) - Uses tokio::fs
//!
//! All paths are normalized vault paths (see `obsidian_fs::normalize_path`);
//! the empty string is the vault root.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Is a directory: {0}")]
    IsDirectory(String),

    #[error("Not a directory: {0}")]
    NotDirectory(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, FsError>;

/// File metadata
#[derive(Debug, Clone)]
pub struct FileStat {
    /// File size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
}

/// Directory entry
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// File or directory name (not full path)
    pub name: String,
    /// Whether this is a directory
    pub is_dir: bool,
}

/// Vault filesystem used by the synchronization engine.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Read a note as UTF-8 text
    async fn read_to_string(&self, path: &str) -> Result<String>;

    /// Create a new file. Fails if the path is taken or the parent folder is missing.
    async fn create(&self, path: &str, content: &str) -> Result<()>;

    /// Move/rename a file, preserving its content. Fails if `to` exists.
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Delete a file or empty directory
    async fn delete(&self, path: &str) -> Result<()>;

    /// List directory contents
    async fn list(&self, path: &str) -> Result<Vec<FileEntry>>;

    /// Check if path exists
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Get file metadata
    async fn stat(&self, path: &str) -> Result<FileStat>;

    /// Create directory (and parents if needed)
    async fn mkdir(&self, path: &str) -> Result<()>;

    /// Whether a directory exists at `path` (the root always does)
    async fn is_dir(&self, path: &str) -> Result<bool> {
        match self.stat(path).await {
            Ok(stat) => Ok(stat.is_dir),
            Err(FsError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// In-memory filesystem for testing
///
/// Listings are sorted by name so scans are deterministic. Individual paths
/// can be made to fail with `fail_on` to exercise per-file error handling.
pub struct InMemoryFs {
    files: RwLock<BTreeMap<String, String>>,
    dirs: RwLock<BTreeSet<String>>,
    failing: RwLock<HashSet<String>>,
}

impl InMemoryFs {
    pub fn new() -> Self {
        let mut dirs = BTreeSet::new();
        dirs.insert(String::new()); // Root directory
        Self {
            files: RwLock::new(BTreeMap::new()),
            dirs: RwLock::new(dirs),
            failing: RwLock::new(HashSet::new()),
        }
    }

    /// Make every operation touching `path` fail with an I/O error
    pub fn fail_on(&self, path: &str) {
        let path = Self::normalize_path(path);
        self.failing.write().unwrap().insert(path);
    }

    /// Write a file directly, creating parent folders (test setup helper)
    pub fn insert_file(&self, path: &str, content: &str) {
        let path = Self::normalize_path(path);
        let mut parent = Self::parent_path(&path);
        {
            let mut dirs = self.dirs.write().unwrap();
            while let Some(p) = parent {
                parent = Self::parent_path(&p);
                dirs.insert(p);
            }
        }
        self.files.write().unwrap().insert(path, content.to_string());
    }

    /// Create a folder directly (test setup helper)
    pub fn insert_dir(&self, path: &str) {
        let mut path = Some(Self::normalize_path(path));
        let mut dirs = self.dirs.write().unwrap();
        while let Some(p) = path {
            path = Self::parent_path(&p);
            dirs.insert(p);
        }
    }

    /// All file paths, sorted
    pub fn file_paths(&self) -> Vec<String> {
        self.files.read().unwrap().keys().cloned().collect()
    }

    /// Content of a file, if present
    pub fn contents(&self, path: &str) -> Option<String> {
        let path = Self::normalize_path(path);
        self.files.read().unwrap().get(&path).cloned()
    }

    /// Whether a folder exists
    pub fn has_dir(&self, path: &str) -> bool {
        let path = Self::normalize_path(path);
        self.dirs.read().unwrap().contains(&path)
    }

    fn normalize_path(path: &str) -> String {
        obsidian_fs::normalize_path(path)
    }

    fn parent_path(path: &str) -> Option<String> {
        if path.is_empty() {
            None
        } else {
            Some(obsidian_fs::parent_path(path).to_string())
        }
    }

    fn check_failing(&self, path: &str) -> Result<()> {
        if self.failing.read().unwrap().contains(path) {
            return Err(FsError::Io(format!("injected failure for {}", path)));
        }
        Ok(())
    }

    fn check_parent(&self, path: &str) -> Result<()> {
        if let Some(parent) = Self::parent_path(path) {
            if !self.dirs.read().unwrap().contains(&parent) {
                return Err(FsError::NotFound(parent));
            }
        }
        Ok(())
    }

    fn is_taken(&self, path: &str) -> bool {
        self.files.read().unwrap().contains_key(path) || self.dirs.read().unwrap().contains(path)
    }
}

impl Default for InMemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystem for InMemoryFs {
    async fn read_to_string(&self, path: &str) -> Result<String> {
        let path = Self::normalize_path(path);
        self.check_failing(&path)?;
        let files = self.files.read().unwrap();
        files
            .get(&path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path))
    }

    async fn create(&self, path: &str, content: &str) -> Result<()> {
        let path = Self::normalize_path(path);
        self.check_failing(&path)?;
        if self.is_taken(&path) {
            return Err(FsError::AlreadyExists(path));
        }
        self.check_parent(&path)?;

        self.files.write().unwrap().insert(path, content.to_string());
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = Self::normalize_path(from);
        let to = Self::normalize_path(to);
        self.check_failing(&from)?;
        self.check_failing(&to)?;
        if self.is_taken(&to) {
            return Err(FsError::AlreadyExists(to));
        }
        self.check_parent(&to)?;

        let mut files = self.files.write().unwrap();
        let content = files.remove(&from).ok_or_else(|| FsError::NotFound(from))?;
        files.insert(to, content);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let path = Self::normalize_path(path);
        self.check_failing(&path)?;

        // Try to delete as file first
        {
            let mut files = self.files.write().unwrap();
            if files.remove(&path).is_some() {
                return Ok(());
            }
        }

        // Try to delete as directory
        {
            let mut dirs = self.dirs.write().unwrap();
            if dirs.remove(&path) {
                return Ok(());
            }
        }

        Err(FsError::NotFound(path))
    }

    async fn list(&self, path: &str) -> Result<Vec<FileEntry>> {
        let path = Self::normalize_path(path);
        self.check_failing(&path)?;

        let dirs = self.dirs.read().unwrap();
        if !dirs.contains(&path) {
            if self.files.read().unwrap().contains_key(&path) {
                return Err(FsError::NotDirectory(path));
            }
            return Err(FsError::NotFound(path));
        }

        let is_child = |candidate: &str| {
            !candidate.is_empty() && Self::parent_path(candidate).as_deref() == Some(path.as_str())
        };
        let name_of = |candidate: &str| candidate.rsplit('/').next().unwrap_or(candidate).to_string();

        let mut entries: Vec<FileEntry> = dirs
            .iter()
            .filter(|d| is_child(d))
            .map(|d| FileEntry {
                name: name_of(d),
                is_dir: true,
            })
            .collect();

        let files = self.files.read().unwrap();
        entries.extend(files.keys().filter(|f| is_child(f)).map(|f| FileEntry {
            name: name_of(f),
            is_dir: false,
        }));

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let path = Self::normalize_path(path);
        self.check_failing(&path)?;
        Ok(self.is_taken(&path))
    }

    async fn stat(&self, path: &str) -> Result<FileStat> {
        let path = Self::normalize_path(path);
        self.check_failing(&path)?;

        let files = self.files.read().unwrap();
        if let Some(content) = files.get(&path) {
            return Ok(FileStat {
                size: content.len() as u64,
                is_dir: false,
            });
        }

        if self.dirs.read().unwrap().contains(&path) {
            return Ok(FileStat {
                size: 0,
                is_dir: true,
            });
        }

        Err(FsError::NotFound(path))
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let path = Self::normalize_path(path);
        self.check_failing(&path)?;
        if self.files.read().unwrap().contains_key(&path) {
            return Err(FsError::NotDirectory(path));
        }
        self.insert_dir(&path);
        Ok(())
    }
}

// Implement FileSystem for Arc<T> where T: FileSystem
// This allows sharing a filesystem between a pass and the index service
#[async_trait]
impl<T: FileSystem + ?Sized> FileSystem for std::sync::Arc<T> {
    async fn read_to_string(&self, path: &str) -> Result<String> {
        (**self).read_to_string(path).await
    }

    async fn create(&self, path: &str, content: &str) -> Result<()> {
        (**self).create(path, content).await
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        (**self).rename(from, to).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        (**self).delete(path).await
    }

    async fn list(&self, path: &str) -> Result<Vec<FileEntry>> {
        (**self).list(path).await
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        (**self).exists(path).await
    }

    async fn stat(&self, path: &str) -> Result<FileStat> {
        (**self).stat(path).await
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        (**self).mkdir(path).await
    }
}
