//! Errors that abort a synchronization pass.
//!
//! Mutations committed before the failing step are not rolled back.

use thiserror::Error;

use crate::fs::FsError;
use crate::remote::RemoteError;
use crate::settings::SettingsError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("The specified notes folder '{0}' does not exist")]
    MissingNoteRoot(String),

    #[error("Template file '{path}' could not be loaded: {source}")]
    Template { path: String, source: FsError },

    #[error("Error fetching projects from Todoist. Please check your API key and try again. ({0})")]
    ProjectListing(RemoteError),

    #[error("Error fetching tasks from Todoist. Please check your API key and try again. ({0})")]
    TaskListing(RemoteError),

    #[error("Error scanning the notes folder: {0}")]
    Scan(FsError),

    #[error("Error creating archive folder '{path}': {source}")]
    ArchiveFolder { path: String, source: FsError },

    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
