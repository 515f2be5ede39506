//! project-sync: keeps a folder of markdown notes in step with the Todoist
//! project hierarchy.
//!
//! This crate provides:
//! - The remote project/task model and the `TodoistApi` trait
//! - Project tree building and note path planning (nested or flat naming)
//! - The note index (project id -> note paths), full scan or incremental
//! - Reconciliation (create / move / conflict) and the deleted-project policy
//! - Task linking (a `Project note: [[...]]` marker in task descriptions)
//! - FileSystem trait abstraction with an in-memory implementation
//!
//! Nothing here touches the real disk or network; the `project-notes` crate
//! supplies native implementations of both traits.

pub mod error;
pub mod fs;
pub mod index;
pub mod linker;
pub mod pass;
pub mod planner;
pub mod reconcile;
pub mod remote;
pub mod report;
pub mod settings;
pub mod template;
pub mod tree;

pub use error::SyncError;
pub use fs::{FileEntry, FileStat, FileSystem, FsError, InMemoryFs};
pub use index::{IndexScope, NoteIndex, PROJECT_ID_KEY, read_project_id};
pub use linker::{MARKER_PREFIX, link_tasks, marker, rewrite_marker};
pub use pass::{index_scope, run_pass};
pub use planner::{NotePaths, plan_paths};
pub use reconcile::{apply_deletion_policy, deleted_ids, reconcile};
pub use remote::{InMemoryTodoist, Project, RemoteError, Task, TodoistApi};
pub use report::{Conflict, Failure, FileMove, Operation, PassReport};
pub use settings::{DeletedProjectHandling, Naming, Settings, SettingsError};
pub use template::{Template, note_content};
pub use tree::ProjectTree;
