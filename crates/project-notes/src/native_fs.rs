//! Native filesystem implementation using tokio::fs.

use async_trait::async_trait;
use project_sync::fs::{FileEntry, FileStat, FileSystem, FsError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Vault on the local disk; vault paths are resolved against `base_path`.
pub struct NativeFs {
    base_path: PathBuf,
}

impl NativeFs {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn full_path(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.base_path.clone()
        } else {
            self.base_path.join(path)
        }
    }
}

/// Map an OS error onto the vault error kinds the engine distinguishes.
fn io_error(path: &str, e: std::io::Error) -> FsError {
    match e.kind() {
        ErrorKind::NotFound => FsError::NotFound(path.to_string()),
        ErrorKind::AlreadyExists => FsError::AlreadyExists(path.to_string()),
        _ => FsError::Io(format!("{}: {}", path, e)),
    }
}

#[async_trait]
impl FileSystem for NativeFs {
    async fn read_to_string(&self, path: &str) -> Result<String> {
        fs::read_to_string(self.full_path(path))
            .await
            .map_err(|e| io_error(path, e))
    }

    async fn create(&self, path: &str, content: &str) -> Result<()> {
        // create_new: never clobber a note that appeared since the check
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.full_path(path))
            .await
            .map_err(|e| io_error(path, e))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| io_error(path, e))?;
        file.flush().await.map_err(|e| io_error(path, e))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let target = self.full_path(to);
        if fs::try_exists(&target).await.map_err(|e| io_error(to, e))? {
            return Err(FsError::AlreadyExists(to.to_string()));
        }

        fs::rename(self.full_path(from), target)
            .await
            .map_err(|e| io_error(from, e))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        let metadata = fs::metadata(&full_path)
            .await
            .map_err(|e| io_error(path, e))?;

        if metadata.is_dir() {
            fs::remove_dir(&full_path).await.map_err(|e| io_error(path, e))
        } else {
            fs::remove_file(&full_path).await.map_err(|e| io_error(path, e))
        }
    }

    async fn list(&self, path: &str) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(self.full_path(path))
            .await
            .map_err(|e| io_error(path, e))?;

        while let Some(entry) = dir.next_entry().await.map_err(|e| io_error(path, e))? {
            let name = entry.file_name().to_string_lossy().to_string();
            // follows symlinks, so a linked folder is walked like a real one
            let is_dir = match fs::metadata(entry.path()).await {
                Ok(metadata) => metadata.is_dir(),
                Err(e) => {
                    // dangling link: list the entry itself, never a folder
                    debug!("Cannot follow {}/{}: {}", path, name, e);
                    entry
                        .file_type()
                        .await
                        .map(|file_type| file_type.is_dir())
                        .unwrap_or(false)
                }
            };

            entries.push(FileEntry { name, is_dir });
        }

        // read_dir order is platform dependent
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        fs::try_exists(self.full_path(path))
            .await
            .map_err(|e| io_error(path, e))
    }

    async fn stat(&self, path: &str) -> Result<FileStat> {
        let metadata = fs::metadata(self.full_path(path))
            .await
            .map_err(|e| io_error(path, e))?;

        Ok(FileStat {
            size: metadata.len(),
            is_dir: metadata.is_dir(),
        })
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        fs::create_dir_all(self.full_path(path))
            .await
            .map_err(|e| io_error(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    #[tokio::test]
    async fn dangling_symlink_does_not_hide_its_folder() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("Projects/Work")).unwrap();
        std::fs::write(
            dir.path().join("Projects/Work/Site.md"),
            project_sync::note_content("2", None),
        )
        .unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("nowhere"),
            dir.path().join("Projects/Work/broken"),
        )
        .unwrap();
        let fs = NativeFs::new(dir.path().to_path_buf());

        let names: Vec<String> = fs
            .list("Projects/Work")
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, ["Site.md", "broken"]);

        let scope = project_sync::IndexScope::new("Projects", "Projects/__ArchivedNotes");
        let index = project_sync::NoteIndex::scan(&fs, &scope).await.unwrap();
        assert_eq!(index.paths("2"), ["Projects/Work/Site.md"]);
    }

    #[tokio::test]
    async fn create_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let fs = NativeFs::new(dir.path().to_path_buf());

        fs.create("Work.md", "first").await.unwrap();
        let err = fs.create("Work.md", "second").await.unwrap_err();

        assert!(matches!(err, FsError::AlreadyExists(_)));
        assert_eq!(fs.read_to_string("Work.md").await.unwrap(), "first");
    }

    #[tokio::test]
    async fn create_needs_parent_folder() {
        let dir = TempDir::new().unwrap();
        let fs = NativeFs::new(dir.path().to_path_buf());

        assert!(matches!(
            fs.create("Missing/Work.md", "x").await,
            Err(FsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rename_refuses_existing_target() {
        let dir = TempDir::new().unwrap();
        let fs = NativeFs::new(dir.path().to_path_buf());
        fs.create("a.md", "a").await.unwrap();
        fs.create("b.md", "b").await.unwrap();

        assert!(matches!(fs.rename("a.md", "b.md").await, Err(FsError::AlreadyExists(_))));

        fs.mkdir("Sub").await.unwrap();
        fs.rename("a.md", "Sub/a.md").await.unwrap();
        assert_eq!(fs.read_to_string("Sub/a.md").await.unwrap(), "a");
        assert!(!fs.exists("a.md").await.unwrap());
    }

    #[tokio::test]
    async fn list_is_sorted() {
        let dir = TempDir::new().unwrap();
        let fs = NativeFs::new(dir.path().to_path_buf());
        fs.create("b.md", "").await.unwrap();
        fs.create("a.md", "").await.unwrap();
        fs.mkdir("c").await.unwrap();

        let entries = fs.list("").await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "b.md", "c"]);
        assert!(entries[2].is_dir);
        assert!(fs.is_dir("c").await.unwrap());
        assert!(!fs.is_dir("nope").await.unwrap());
    }
}
