//! Long-lived note index kept current from file events.
//!
//! One tokio task owns the [`NoteIndex`]; everything else talks to it over a
//! channel, so events are applied one at a time in arrival order. The note
//! root and archive folder are fixed when the task is spawned: changing them
//! in the settings requires a restart, until then the index is stale.

use std::sync::Arc;

use project_sync::{FileSystem, IndexScope, NoteIndex};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::watcher::{FileEvent, FileEventKind};

#[derive(Debug, Error)]
pub enum IndexServiceError {
    #[error("The note index service has stopped")]
    Stopped,
}

enum IndexCommand {
    /// Created, modified or renamed-to: re-read the header
    FileChanged(String),
    /// Deleted or renamed-from
    FileDeleted(String),
    /// Folder created or renamed-to: re-read everything under it
    FolderChanged(String),
    /// Folder deleted or renamed-from
    FolderRemoved(String),
    /// Replace the whole index (after a pass reconciled it)
    Replace(NoteIndex),
    Snapshot(oneshot::Sender<NoteIndex>),
}

/// Handle to the index task. Dropping every handle stops the task.
#[derive(Clone)]
pub struct IndexHandle {
    tx: mpsc::UnboundedSender<IndexCommand>,
}

impl IndexHandle {
    /// Start the task with an initial (scanned) index.
    pub fn spawn<F>(fs: Arc<F>, scope: IndexScope, initial: NoteIndex) -> (Self, JoinHandle<()>)
    where
        F: FileSystem + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(fs, scope, initial, rx));
        (Self { tx }, task)
    }

    pub fn file_changed(&self, path: &str) -> Result<(), IndexServiceError> {
        self.send(IndexCommand::FileChanged(path.to_string()))
    }

    pub fn file_deleted(&self, path: &str) -> Result<(), IndexServiceError> {
        self.send(IndexCommand::FileDeleted(path.to_string()))
    }

    pub fn folder_changed(&self, path: &str) -> Result<(), IndexServiceError> {
        self.send(IndexCommand::FolderChanged(path.to_string()))
    }

    pub fn folder_removed(&self, path: &str) -> Result<(), IndexServiceError> {
        self.send(IndexCommand::FolderRemoved(path.to_string()))
    }

    /// Forward a watcher event.
    pub fn apply(&self, event: FileEvent) -> Result<(), IndexServiceError> {
        let command = match event.kind {
            FileEventKind::Modified => IndexCommand::FileChanged(event.path),
            FileEventKind::Deleted => IndexCommand::FileDeleted(event.path),
            FileEventKind::FolderChanged => IndexCommand::FolderChanged(event.path),
            FileEventKind::FolderRemoved => IndexCommand::FolderRemoved(event.path),
        };
        self.send(command)
    }

    pub fn replace(&self, index: NoteIndex) -> Result<(), IndexServiceError> {
        self.send(IndexCommand::Replace(index))
    }

    /// Copy of the index after every command sent before this one.
    pub async fn snapshot(&self) -> Result<NoteIndex, IndexServiceError> {
        let (reply, response) = oneshot::channel();
        self.send(IndexCommand::Snapshot(reply))?;
        response.await.map_err(|_| IndexServiceError::Stopped)
    }

    fn send(&self, command: IndexCommand) -> Result<(), IndexServiceError> {
        self.tx.send(command).map_err(|_| IndexServiceError::Stopped)
    }
}

async fn run<F: FileSystem>(
    fs: Arc<F>,
    scope: IndexScope,
    mut index: NoteIndex,
    mut rx: mpsc::UnboundedReceiver<IndexCommand>,
) {
    debug!("Index service started for '{}'", scope.root());

    while let Some(command) = rx.recv().await {
        match command {
            IndexCommand::FileChanged(path) => {
                if let Err(e) = index.refresh_path(fs.as_ref(), &scope, &path).await {
                    warn!("Failed to re-index {}: {}", path, e);
                }
            }
            IndexCommand::FileDeleted(path) => {
                if let Some(id) = index.remove_path(&path) {
                    debug!("{} (project {}) removed from index", path, id);
                }
            }
            IndexCommand::FolderChanged(path) => {
                if let Err(e) = index.refresh_folder(fs.as_ref(), &scope, &path).await {
                    warn!("Failed to re-index folder {}: {}", path, e);
                }
            }
            IndexCommand::FolderRemoved(path) => {
                let dropped = index.remove_prefix(&path);
                if dropped > 0 {
                    debug!("{} removed, dropped {} notes from index", path, dropped);
                }
            }
            IndexCommand::Replace(next) => index = next,
            IndexCommand::Snapshot(reply) => {
                // Requester gone; nothing to do
                let _ = reply.send(index.clone());
            }
        }
    }

    debug!("Index service stopped");
}
