//! Index of existing project notes, keyed by the project id in their frontmatter.
//!
//! Built by a full scan of the note root (archive folder excluded), or kept
//! current incrementally by feeding it file events through
//! [`NoteIndex::refresh_path`] and [`NoteIndex::remove_path`].

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use obsidian_fs::{frontmatter_field, is_hidden, is_markdown, is_within, join_path, parse_frontmatter};
use tracing::{debug, info, warn};

use crate::fs::{FileSystem, FsError};

/// Frontmatter key holding the Todoist project id
pub const PROJECT_ID_KEY: &str = "todoist-project-id";

/// Number of note headers read concurrently during a scan
const SCAN_CONCURRENCY: usize = 16;

/// Extract the project id from a note's frontmatter.
pub fn read_project_id(content: &str) -> Option<String> {
    let parsed = parse_frontmatter(content);
    parsed
        .frontmatter
        .as_ref()
        .and_then(|fm| frontmatter_field(fm, PROJECT_ID_KEY))
}

/// Which files the index tracks: markdown notes under the note root,
/// outside the archive folder and outside hidden folders.
///
/// An archive folder that resolves to the root itself excludes nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexScope {
    root: String,
    archive: String,
}

impl IndexScope {
    /// Both paths must be normalized vault paths.
    pub fn new(root: impl Into<String>, archive: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            archive: archive.into(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn archive(&self) -> &str {
        &self.archive
    }

    pub fn covers(&self, path: &str) -> bool {
        is_markdown(path) && !is_hidden(path) && is_within(path, &self.root) && !self.in_archive(path)
    }

    /// Whether `path` (file or folder) lies in the archive folder.
    pub fn in_archive(&self, path: &str) -> bool {
        self.archive != self.root && is_within(path, &self.archive)
    }
}

/// Project id -> note paths, plus the reverse mapping.
///
/// More than one path for an id is a conflict the reconciler reports; the
/// index itself just records what it finds.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NoteIndex {
    by_id: HashMap<String, Vec<String>>,
    by_path: HashMap<String, String>,
}

impl NoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every note in scope and read its project id.
    ///
    /// Folders are walked with an explicit worklist; headers are read
    /// concurrently but applied in enumeration order. Unreadable notes and
    /// sub-folders are skipped with a warning; failing to list the root is
    /// an error.
    pub async fn scan<F: FileSystem>(fs: &F, scope: &IndexScope) -> Result<Self, FsError> {
        let files = collect_notes(fs, scope, scope.root()).await?;
        debug!("Found {} notes under '{}'", files.len(), scope.root());

        let reads: Vec<(String, Result<String, FsError>)> = stream::iter(files)
            .map(|path| async move {
                let content = fs.read_to_string(&path).await;
                (path, content)
            })
            .buffered(SCAN_CONCURRENCY)
            .collect()
            .await;

        let mut index = Self::new();
        index.file_reads(reads);

        info!(
            "Indexed {} project notes for {} projects",
            index.by_path.len(),
            index.by_id.len()
        );
        Ok(index)
    }

    fn file_reads(&mut self, reads: Vec<(String, Result<String, FsError>)>) {
        for (path, content) in reads {
            match content {
                Ok(content) => {
                    if let Some(id) = read_project_id(&content) {
                        self.insert(&id, &path);
                    }
                }
                Err(e) => warn!("Failed to read {}: {}", path, e),
            }
        }
    }

    /// Associate `path` with `id`. A path already filed under another id is moved.
    pub fn insert(&mut self, id: &str, path: &str) {
        match self.by_path.get(path) {
            Some(existing) if existing == id => return,
            Some(_) => {
                self.remove_path(path);
            }
            None => {}
        }

        self.by_id
            .entry(id.to_string())
            .or_default()
            .push(path.to_string());
        self.by_path.insert(path.to_string(), id.to_string());
    }

    /// Forget `path`, dropping its id entirely if no other note carries it.
    ///
    /// Returns the id the path was filed under.
    pub fn remove_path(&mut self, path: &str) -> Option<String> {
        let id = self.by_path.remove(path)?;
        if let Some(paths) = self.by_id.get_mut(&id) {
            paths.retain(|p| p != path);
            if paths.is_empty() {
                self.by_id.remove(&id);
            }
        }
        Some(id)
    }

    /// Record that a note was moved (its id is unchanged).
    pub fn rename_path(&mut self, from: &str, to: &str) {
        if let Some(id) = self.remove_path(from) {
            self.insert(&id, to);
        }
    }

    /// Re-read one file and update its association.
    ///
    /// Handles create/modify/rename events: a file that left the scope,
    /// vanished, or lost its id is dropped; otherwise it is filed under the
    /// id currently in its header.
    pub async fn refresh_path<F: FileSystem>(
        &mut self,
        fs: &F,
        scope: &IndexScope,
        path: &str,
    ) -> Result<(), FsError> {
        if !scope.covers(path) {
            if self.remove_path(path).is_some() {
                debug!("{} left the note folder, dropped from index", path);
            }
            return Ok(());
        }

        let content = match fs.read_to_string(path).await {
            Ok(content) => content,
            Err(FsError::NotFound(_)) => {
                self.remove_path(path);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match read_project_id(&content) {
            Some(id) => self.insert(&id, path),
            None => {
                self.remove_path(path);
            }
        }
        Ok(())
    }

    /// Forget every note at or below `folder`.
    ///
    /// Returns how many paths were dropped.
    pub fn remove_prefix(&mut self, folder: &str) -> usize {
        let mut stale: Vec<String> = self
            .by_path
            .keys()
            .filter(|path| is_within(path.as_str(), folder))
            .cloned()
            .collect();
        stale.sort();
        for path in &stale {
            self.remove_path(path);
        }
        stale.len()
    }

    /// Re-read every note at or below `folder`.
    ///
    /// A folder rename or move arrives as one event for the folder, not one
    /// per note inside it, so everything previously filed under the folder is
    /// dropped and whatever is there now is read again. A folder that no
    /// longer exists just loses its notes.
    pub async fn refresh_folder<F: FileSystem>(
        &mut self,
        fs: &F,
        scope: &IndexScope,
        folder: &str,
    ) -> Result<(), FsError> {
        let dropped = self.remove_prefix(folder);

        // A folder holding the note root means the whole root moved
        let start = if is_within(scope.root(), folder) {
            self.remove_prefix(scope.root());
            scope.root()
        } else if is_within(folder, scope.root()) {
            folder
        } else {
            return Ok(());
        };

        let files = match collect_notes(fs, scope, start).await {
            Ok(files) => files,
            Err(FsError::NotFound(_)) => {
                debug!("{} is gone, dropped {} notes", folder, dropped);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let mut reads = Vec::with_capacity(files.len());
        for path in files {
            let content = fs.read_to_string(&path).await;
            reads.push((path, content));
        }
        self.file_reads(reads);

        debug!("Re-indexed {} (dropped {} stale notes)", folder, dropped);
        Ok(())
    }

    /// Notes carrying `id`, in discovery order
    pub fn paths(&self, id: &str) -> &[String] {
        self.by_id.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Project id of the note at `path`
    pub fn id_for(&self, path: &str) -> Option<&str> {
        self.by_path.get(path).map(String::as_str)
    }

    /// All indexed project ids (unordered)
    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.by_id.keys()
    }

    /// Number of distinct project ids
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Enumerate every in-scope note below `start`.
async fn collect_notes<F: FileSystem>(
    fs: &F,
    scope: &IndexScope,
    start: &str,
) -> Result<Vec<String>, FsError> {
    let mut files = Vec::new();
    let mut pending = vec![start.to_string()];
    let mut is_root = true;

    while let Some(dir) = pending.pop() {
        let entries = match fs.list(&dir).await {
            Ok(entries) => entries,
            Err(e) if is_root => return Err(e),
            Err(e) => {
                warn!("Failed to list {}: {}", dir, e);
                continue;
            }
        };
        is_root = false;

        let mut subdirs = Vec::new();
        for entry in entries {
            if entry.name.starts_with('.') {
                continue;
            }
            let path = join_path(&[&dir, &entry.name]);
            if entry.is_dir {
                if !scope.in_archive(&path) {
                    subdirs.push(path);
                }
            } else if scope.covers(&path) {
                files.push(path);
            }
        }
        // Reverse so folders are visited in listing order
        pending.extend(subdirs.into_iter().rev());
    }

    Ok(files)
}
