//! Link every task back to its project note.

use obsidian_fs::note_basename;
use tracing::{debug, info};

use crate::error::{Result, SyncError};
use crate::index::NoteIndex;
use crate::remote::TodoistApi;
use crate::report::{Operation, PassReport};

/// Start of the marker line; a first line starting with this is ours.
pub const MARKER_PREFIX: &str = "Project note: ";

/// `Project note: [[<basename>]]`
pub fn marker(basename: &str) -> String {
    format!("{}[[{}]]", MARKER_PREFIX, basename)
}

/// Put the marker on the first line of a task description.
///
/// An existing marker line is replaced (the note may have been renamed
/// since it was written); otherwise the marker is prepended. Every other
/// line is kept as-is, so applying this twice gives the same result.
pub fn rewrite_marker(description: &str, basename: &str) -> String {
    let marker = marker(basename);
    if description.is_empty() {
        return marker;
    }

    match description.split_once('\n') {
        Some((first, rest)) if first.starts_with(MARKER_PREFIX) => format!("{}\n{}", marker, rest),
        None if description.starts_with(MARKER_PREFIX) => marker,
        _ => format!("{}\n{}", marker, description),
    }
}

/// Rewrite the description of every task whose project has exactly one note.
///
/// Failing to list tasks aborts linking; a failed update is reported and
/// the remaining tasks are still processed. Descriptions are written back
/// even when unchanged.
pub async fn link_tasks<A: TodoistApi + ?Sized>(
    api: &A,
    index: &NoteIndex,
    report: &mut PassReport,
) -> Result<()> {
    let tasks = api.list_tasks().await.map_err(SyncError::TaskListing)?;
    debug!("Fetched {} tasks", tasks.len());

    let mut linked = 0;
    for task in tasks {
        let [path] = index.paths(&task.project_id) else {
            continue;
        };

        let description = rewrite_marker(&task.description, note_basename(path));
        match api.update_task_description(&task.id, &description).await {
            Ok(()) => {
                report.record_linked(&task.id);
                linked += 1;
            }
            Err(e) => report.record_failure(Operation::UpdateTask, &task.id, e),
        }
    }

    info!("Linked {} task(s) to their project notes", linked);
    Ok(())
}
