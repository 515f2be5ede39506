//! Bring the note folder in line with the planned paths.
//!
//! Two sub-phases, strictly in this order: create/move for every reachable
//! project, then the deletion policy for indexed ids that no longer exist
//! remotely. A renamed project is therefore always moved before anything
//! could mistake its old note for a deleted one.

use obsidian_fs::{ensure_markdown_extension, join_path, note_basename};
use tracing::{debug, info};

use crate::error::{Result, SyncError};
use crate::fs::FileSystem;
use crate::index::{NoteIndex, read_project_id};
use crate::planner::NotePaths;
use crate::report::{Conflict, Operation, PassReport};
use crate::settings::DeletedProjectHandling;
use crate::template::{Template, note_content};
use crate::tree::ProjectTree;

/// Create or move the note of every reachable project.
///
/// Never fails as a whole: conflicts and per-note I/O errors go into the
/// report and the walk continues with the next project. The index is kept
/// current with every committed create and move.
pub async fn reconcile<F: FileSystem>(
    fs: &F,
    tree: &ProjectTree,
    paths: &NotePaths,
    index: &mut NoteIndex,
    template: Option<&Template>,
    report: &mut PassReport,
) {
    for project in tree.depth_first() {
        let Some(planned) = paths.get(&project.id) else {
            continue;
        };
        let target = ensure_markdown_extension(planned);

        let occupied = match fs.exists(&target).await {
            Ok(occupied) => occupied,
            Err(e) => {
                report.record_failure(Operation::ReadNote, &target, e);
                continue;
            }
        };

        if occupied {
            check_existing(fs, &project.id, &target, index, report).await;
            continue;
        }

        let existing = index.paths(&project.id).to_vec();
        match existing.len() {
            0 => {
                let content = note_content(&project.id, template);
                match fs.create(&target, &content).await {
                    Ok(()) => {
                        index.insert(&project.id, &target);
                        report.record_created(&target);
                    }
                    Err(e) => report.record_failure(Operation::CreateNote, &target, e),
                }
            }
            1 => {
                let from = &existing[0];
                match fs.rename(from, &target).await {
                    Ok(()) => {
                        index.rename_path(from, &target);
                        report.record_moved(from, &target);
                    }
                    Err(e) => report.record_failure(Operation::MoveNote, &target, e),
                }
            }
            _ => report.record_conflict(Conflict::DuplicateId {
                project_id: project.id.clone(),
                planned: planned.to_string(),
                paths: existing,
            }),
        }
    }
}

/// A file already sits at the planned path: it must belong to this project.
async fn check_existing<F: FileSystem>(
    fs: &F,
    project_id: &str,
    target: &str,
    index: &mut NoteIndex,
    report: &mut PassReport,
) {
    let found_id = match fs.read_to_string(target).await {
        Ok(content) => read_project_id(&content),
        Err(e) => {
            report.record_failure(Operation::ReadNote, target, e);
            return;
        }
    };

    if found_id.as_deref() == Some(project_id) {
        debug!("{} is up to date", target);
        index.insert(project_id, target);
    } else {
        report.record_conflict(Conflict::PathTaken {
            project_id: project_id.to_string(),
            path: target.to_string(),
            found_id,
        });
    }
}

/// Indexed ids with no project in the current tree, sorted.
///
/// Orphaned projects are still registered in the tree, so their notes are
/// not considered deleted.
pub fn deleted_ids(tree: &ProjectTree, index: &NoteIndex) -> Vec<String> {
    let mut deleted: Vec<String> = index
        .ids()
        .filter(|id| !tree.contains(id))
        .cloned()
        .collect();
    deleted.sort();
    deleted
}

/// Apply the deleted-project disposition to every note of a deleted project.
///
/// Only failing to create the archive folder is an error; every per-file
/// failure is reported and the remaining files are still processed.
pub async fn apply_deletion_policy<F: FileSystem>(
    fs: &F,
    tree: &ProjectTree,
    index: &mut NoteIndex,
    policy: DeletedProjectHandling,
    archive: &str,
    report: &mut PassReport,
) -> Result<()> {
    let deleted = deleted_ids(tree, index);
    if deleted.is_empty() {
        return Ok(());
    }
    info!("{} project(s) no longer exist in Todoist", deleted.len());

    match policy {
        DeletedProjectHandling::Ignore => {
            debug!("Leaving notes of deleted projects in place: {:?}", deleted);
        }
        DeletedProjectHandling::Archive => {
            ensure_archive(fs, archive, report).await?;
            for id in &deleted {
                for path in index.paths(id).to_vec() {
                    let to = join_path(&[archive, &format!("{}-{}.md", id, note_basename(&path))]);
                    match fs.rename(&path, &to).await {
                        Ok(()) => {
                            index.remove_path(&path);
                            report.record_archived(&path, &to);
                        }
                        Err(e) => report.record_failure(Operation::ArchiveNote, &path, e),
                    }
                }
            }
        }
        DeletedProjectHandling::Delete => {
            for id in &deleted {
                for path in index.paths(id).to_vec() {
                    match fs.delete(&path).await {
                        Ok(()) => {
                            index.remove_path(&path);
                            report.record_deleted(&path);
                        }
                        Err(e) => report.record_failure(Operation::DeleteNote, &path, e),
                    }
                }
            }
        }
    }

    Ok(())
}

async fn ensure_archive<F: FileSystem>(fs: &F, archive: &str, report: &mut PassReport) -> Result<()> {
    let exists = fs.is_dir(archive).await.map_err(|source| SyncError::ArchiveFolder {
        path: archive.to_string(),
        source,
    })?;
    if !exists {
        fs.mkdir(archive).await.map_err(|source| SyncError::ArchiveFolder {
            path: archive.to_string(),
            source,
        })?;
        report.record_folder(archive);
    }
    Ok(())
}
