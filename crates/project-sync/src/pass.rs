//! One end-to-end synchronization pass.
//!
//! settings check -> (project listing || note scan) -> tree -> plan ->
//! create/move -> deletion policy -> task links
//!
//! Everything the pass did is recorded in the caller's [`PassReport`], which
//! stays valid when the pass aborts part way through.

use tracing::{info, warn};

use crate::error::{Result, SyncError};
use crate::fs::FileSystem;
use crate::index::{IndexScope, NoteIndex};
use crate::linker::link_tasks;
use crate::planner::plan_paths;
use crate::reconcile::{apply_deletion_policy, reconcile};
use crate::remote::TodoistApi;
use crate::report::PassReport;
use crate::settings::Settings;
use crate::template::Template;
use crate::tree::ProjectTree;

/// Index scope for the configured note folder and archive.
pub fn index_scope(settings: &Settings) -> IndexScope {
    IndexScope::new(settings.note_root(), settings.archive_path())
}

/// Run a synchronization pass and return the reconciled note index.
///
/// With `index: None` the note folder is scanned from scratch; otherwise the
/// supplied (incrementally maintained) index is used as-is. The project
/// listing and the scan run concurrently. Any error means the pass stopped
/// at that step; changes already made are not rolled back.
pub async fn run_pass<F, A>(
    fs: &F,
    api: &A,
    settings: &Settings,
    index: Option<NoteIndex>,
    report: &mut PassReport,
) -> Result<NoteIndex>
where
    F: FileSystem,
    A: TodoistApi + ?Sized,
{
    settings.validate()?;
    if !settings.nested {
        if let Some(warning) = settings.separator_warning() {
            report.record_warning(warning.to_string());
        }
    }

    let root = settings.note_root();
    if !fs.is_dir(&root).await? {
        return Err(SyncError::MissingNoteRoot(settings.note_folder.clone()));
    }

    let template = match settings.template_path() {
        Some(path) => match Template::load(fs, &path).await {
            Ok(template) => Some(template),
            Err(source) => return Err(SyncError::Template { path, source }),
        },
        None => None,
    };

    let scope = index_scope(settings);
    let scan = async {
        match index {
            Some(index) => Ok(index),
            None => NoteIndex::scan(fs, &scope).await,
        }
    };
    let (projects, index) = futures::join!(api.list_projects(), scan);
    let projects = projects.map_err(SyncError::ProjectListing)?;
    let mut index = index.map_err(SyncError::Scan)?;
    info!("Fetched {} projects, {} indexed notes", projects.len(), index.len());

    let tree = ProjectTree::build(projects);
    for orphan in tree.unreachable() {
        warn!("Project {} has no reachable parent", orphan.id);
        report.record_warning(format!(
            "Project '{}' ({}) belongs to a parent project that was not found; its note is not synchronized",
            orphan.name, orphan.id
        ));
    }

    let paths = plan_paths(fs, &tree, &settings.naming(), &root, report).await;
    reconcile(fs, &tree, &paths, &mut index, template.as_ref(), report).await;
    apply_deletion_policy(
        fs,
        &tree,
        &mut index,
        settings.deleted_project_handling,
        &settings.archive_path(),
        report,
    )
    .await?;

    if settings.link_tasks {
        link_tasks(api, &index, report).await?;
    }

    info!("Sync finished: {}", report.summary());
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFs;
    use crate::remote::{InMemoryTodoist, Project};
    use crate::settings::SettingsError;

    fn settings() -> Settings {
        Settings {
            api_key: "token".to_string(),
            note_folder: "Projects".to_string(),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn invalid_settings_abort_before_any_io() {
        let fs = InMemoryFs::new();
        let api = InMemoryTodoist::new();
        let mut report = PassReport::new();
        let settings = Settings {
            api_key: String::new(),
            ..settings()
        };

        let result = run_pass(&fs, &api, &settings, None, &mut report).await;
        assert!(matches!(result, Err(SyncError::Settings(SettingsError::MissingApiKey))));
    }

    #[tokio::test]
    async fn missing_root_aborts() {
        let fs = InMemoryFs::new();
        let api = InMemoryTodoist::with_projects(vec![Project::new("1", "Work", None)]);
        let mut report = PassReport::new();

        let result = run_pass(&fs, &api, &settings(), None, &mut report).await;
        assert!(matches!(result, Err(SyncError::MissingNoteRoot(_))));
        assert!(fs.file_paths().is_empty());
    }

    #[tokio::test]
    async fn missing_template_aborts() {
        let fs = InMemoryFs::new();
        fs.insert_dir("Projects");
        let api = InMemoryTodoist::with_projects(vec![Project::new("1", "Work", None)]);
        let mut report = PassReport::new();
        let settings = Settings {
            template_file: "Templates/Project".to_string(),
            ..settings()
        };

        let result = run_pass(&fs, &api, &settings, None, &mut report).await;
        assert!(matches!(result, Err(SyncError::Template { .. })));
        assert!(fs.file_paths().is_empty());
    }

    #[tokio::test]
    async fn supplied_index_skips_the_scan() {
        let fs = InMemoryFs::new();
        fs.insert_file("Projects/Renamed elsewhere.md", "---\ntodoist-project-id: '1'\n---");
        let api = InMemoryTodoist::with_projects(vec![Project::new("1", "Work", None)]);
        let mut report = PassReport::new();
        let mut index = NoteIndex::new();
        index.insert("1", "Projects/Renamed elsewhere.md");

        let index = run_pass(&fs, &api, &settings(), Some(index), &mut report)
            .await
            .unwrap();

        assert_eq!(report.moved.len(), 1);
        assert_eq!(index.paths("1"), ["Projects/Work.md"]);
    }

    #[tokio::test]
    async fn orphans_are_reported() {
        let fs = InMemoryFs::new();
        fs.insert_dir("Projects");
        let api = InMemoryTodoist::with_projects(vec![
            Project::new("1", "Work", None),
            Project::new("9", "Lost", Some("404")),
        ]);
        let mut report = PassReport::new();

        run_pass(&fs, &api, &settings(), None, &mut report).await.unwrap();

        assert_eq!(report.created, vec!["Projects/Work.md"]);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("'Lost' (9)"));
    }
}
