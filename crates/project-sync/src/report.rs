//! Outcome of a synchronization pass.
//!
//! Conflicts and per-item failures never abort a pass; they are collected
//! here (and logged as they happen) so the host can show every one of them.

use serde::Serialize;
use tracing::{error, info, warn};

/// A file moved by the pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMove {
    pub from: String,
    pub to: String,
}

/// Situations the user has to resolve by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Conflict {
    /// Several notes carry the same project id
    DuplicateId {
        project_id: String,
        planned: String,
        paths: Vec<String>,
    },
    /// The planned path is taken by a note for another (or no) project
    PathTaken {
        project_id: String,
        path: String,
        found_id: Option<String>,
    },
}

/// Which operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    CreateFolder,
    CreateNote,
    MoveNote,
    ReadNote,
    ArchiveNote,
    DeleteNote,
    UpdateTask,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self {
            Operation::CreateFolder => "creating folder",
            Operation::CreateNote => "creating note",
            Operation::MoveNote => "moving note to",
            Operation::ReadNote => "reading note",
            Operation::ArchiveNote => "archiving note",
            Operation::DeleteNote => "deleting note",
            Operation::UpdateTask => "updating task",
        };
        f.write_str(verb)
    }
}

/// A per-item failure that was caught and skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub operation: Operation,
    pub target: String,
    pub message: String,
}

/// Everything a pass did, or could not do.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PassReport {
    /// Notes created for new projects
    pub created: Vec<String>,
    /// Notes moved because their project was renamed or re-parented
    pub moved: Vec<FileMove>,
    /// Notes of deleted projects moved into the archive
    pub archived: Vec<FileMove>,
    /// Notes of deleted projects removed
    pub deleted: Vec<String>,
    /// Folders created for projects with children
    pub folders_created: Vec<String>,
    /// Tasks whose description now links to their project note
    pub linked_tasks: Vec<String>,
    pub conflicts: Vec<Conflict>,
    pub failures: Vec<Failure>,
    /// Non-fatal diagnostics (orphaned projects, path collisions, ...)
    pub warnings: Vec<String>,
}

impl PassReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the pass changed any note
    pub fn has_changes(&self) -> bool {
        self.mutation_count() > 0
    }

    /// Number of notes created, moved, archived or deleted
    pub fn mutation_count(&self) -> usize {
        self.created.len() + self.moved.len() + self.archived.len() + self.deleted.len()
    }

    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty() && self.failures.is_empty()
    }

    pub(crate) fn record_created(&mut self, path: &str) {
        info!("Created note {}", path);
        self.created.push(path.to_string());
    }

    pub(crate) fn record_moved(&mut self, from: &str, to: &str) {
        info!("Moved note {} -> {}", from, to);
        self.moved.push(FileMove {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    pub(crate) fn record_archived(&mut self, from: &str, to: &str) {
        info!("Archived note {} -> {}", from, to);
        self.archived.push(FileMove {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    pub(crate) fn record_deleted(&mut self, path: &str) {
        info!("Deleted note {}", path);
        self.deleted.push(path.to_string());
    }

    pub(crate) fn record_folder(&mut self, path: &str) {
        info!("Created folder {}", path);
        self.folders_created.push(path.to_string());
    }

    pub(crate) fn record_linked(&mut self, task_id: &str) {
        self.linked_tasks.push(task_id.to_string());
    }

    pub(crate) fn record_conflict(&mut self, conflict: Conflict) {
        warn!("Conflict: {}", describe_conflict(&conflict));
        self.conflicts.push(conflict);
    }

    pub(crate) fn record_failure(
        &mut self,
        operation: Operation,
        target: &str,
        err: impl std::fmt::Display,
    ) {
        error!("Error {} '{}': {}", operation, target, err);
        self.failures.push(Failure {
            operation,
            target: target.to_string(),
            message: err.to_string(),
        });
    }

    pub(crate) fn record_warning(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// One human-readable line per conflict, failure and warning.
    pub fn notices(&self) -> Vec<String> {
        let mut notices: Vec<String> = self.conflicts.iter().map(describe_conflict).collect();
        notices.extend(
            self.failures
                .iter()
                .map(|f| format!("Error {} '{}': {}", f.operation, f.target, f.message)),
        );
        notices.extend(self.warnings.iter().cloned());
        notices
    }

    /// One-line summary of the pass
    pub fn summary(&self) -> String {
        format!(
            "{} created, {} moved, {} archived, {} deleted, {} task(s) linked, {} conflict(s), {} error(s)",
            self.created.len(),
            self.moved.len(),
            self.archived.len(),
            self.deleted.len(),
            self.linked_tasks.len(),
            self.conflicts.len(),
            self.failures.len()
        )
    }
}

fn describe_conflict(conflict: &Conflict) -> String {
    match conflict {
        Conflict::DuplicateId { planned, paths, .. } => format!(
            "Multiple notes containing the same project ID as '{}' exist ({}). Please deal with this manually.",
            planned,
            paths.join(", ")
        ),
        Conflict::PathTaken { path, .. } => format!(
            "A note with the name '{}' already exists, but with a different Todoist project ID. Please rename or move the note manually.",
            path
        ),
    }
}
