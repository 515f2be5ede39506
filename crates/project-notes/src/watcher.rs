//! File watcher with debouncing for vault changes.
//!
//! Uses notify-debouncer-mini. A rename shows up as two events (old path
//! gone, new path present), which is all the note index needs. Renaming or
//! deleting a folder only reports the folder itself, so folder events are
//! passed on as well and the index re-reads the whole folder.

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::{DebouncedEvent, new_debouncer};
use obsidian_fs::{is_hidden, is_markdown, normalize_path};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// File event from the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// Normalized vault path
    pub path: String,
    pub kind: FileEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    /// Created, modified, or the target of a rename
    Modified,
    /// Deleted, or the source of a rename
    Deleted,
    /// Folder created or the target of a rename
    FolderChanged,
    /// A non-note path vanished; may have been a folder
    FolderRemoved,
}

/// What is at an event's path once the debounce window closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    File,
    Folder,
    Missing,
}

/// File watcher that monitors the vault directory.
pub struct FileWatcher {
    vault_path: PathBuf,
    /// Debouncer handle (must keep alive)
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    event_rx: mpsc::UnboundedReceiver<FileEvent>,
}

impl FileWatcher {
    /// Watch the whole vault recursively with a 200ms debounce.
    pub fn new(vault_path: PathBuf) -> Result<Self> {
        // FSEvents on macOS reports canonical paths (/private/var/...)
        let vault_path = vault_path.canonicalize().unwrap_or(vault_path);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let root = vault_path.clone();

        let mut debouncer = new_debouncer(
            Duration::from_millis(200),
            move |result: Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    for event in events {
                        let Some(file_event) = Self::process_event(&event, &root) else {
                            continue;
                        };
                        if event_tx.send(file_event).is_err() {
                            // Receiver dropped
                            return;
                        }
                    }
                }
                Err(e) => error!("File watcher error: {}", e),
            },
        )?;

        debouncer
            .watcher()
            .watch(&vault_path, RecursiveMode::Recursive)?;

        Ok(Self {
            vault_path,
            _debouncer: debouncer,
            event_rx,
        })
    }

    fn process_event(event: &DebouncedEvent, vault_path: &Path) -> Option<FileEvent> {
        let relative = event.path.strip_prefix(vault_path).ok()?.to_str()?;
        // Debounced events only say "something happened"; what is there now decides which
        let state = match event.path.metadata() {
            Ok(metadata) if metadata.is_dir() => PathState::Folder,
            Ok(_) => PathState::File,
            Err(_) => PathState::Missing,
        };
        classify(relative, state)
    }

    pub fn event_rx(&mut self) -> &mut mpsc::UnboundedReceiver<FileEvent> {
        &mut self.event_rx
    }

    pub fn vault_path(&self) -> &Path {
        &self.vault_path
    }
}

/// Turn a raw vault-relative path into an event, skipping hidden paths and
/// files that are not markdown notes.
pub fn classify(relative: &str, state: PathState) -> Option<FileEvent> {
    let path = normalize_path(relative);
    if path.is_empty() || is_hidden(&path) {
        return None;
    }

    let kind = match state {
        PathState::Folder => FileEventKind::FolderChanged,
        PathState::File if is_markdown(&path) => FileEventKind::Modified,
        PathState::Missing if is_markdown(&path) => FileEventKind::Deleted,
        PathState::Missing => FileEventKind::FolderRemoved,
        PathState::File => return None,
    };
    debug!("File event: {:?} - {}", kind, path);
    Some(FileEvent { path, kind })
}
