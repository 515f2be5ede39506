//! Full synchronization passes against the in-memory filesystem and
//! Todoist double.
//!
//! Each test sets up a vault and an account, runs one or more passes, and
//! checks the resulting files, task descriptions and report.

use project_sync::{
    Conflict, DeletedProjectHandling, InMemoryFs, InMemoryTodoist, NoteIndex, PassReport, Project,
    Settings, SyncError, Task, note_content, run_pass,
};

fn settings() -> Settings {
    Settings {
        api_key: "token".to_string(),
        note_folder: "Projects".to_string(),
        ..Settings::default()
    }
}

fn hierarchy() -> Vec<Project> {
    vec![
        Project::new("1", "Work", None),
        Project::new("2", "Website", Some("1")),
        Project::new("3", "Launch", Some("2")),
        Project::new("4", "Home", None),
    ]
}

fn vault() -> InMemoryFs {
    let fs = InMemoryFs::new();
    fs.insert_dir("Projects");
    fs
}

async fn sync(fs: &InMemoryFs, api: &InMemoryTodoist, settings: &Settings) -> PassReport {
    let mut report = PassReport::new();
    run_pass(fs, api, settings, None, &mut report)
        .await
        .expect("pass should succeed");
    report
}

#[tokio::test]
async fn first_pass_creates_nested_notes() {
    let fs = vault();
    let api = InMemoryTodoist::with_projects(hierarchy());

    let report = sync(&fs, &api, &settings()).await;

    assert_eq!(
        fs.file_paths(),
        vec![
            "Projects/Home.md",
            "Projects/Work.md",
            "Projects/Work/Website.md",
            "Projects/Work/Website/Launch.md",
        ]
    );
    assert_eq!(report.created.len(), 4);
    assert_eq!(fs.contents("Projects/Work/Website/Launch.md"), Some(note_content("3", None)));
    assert!(report.is_clean());
}

#[tokio::test]
async fn second_pass_is_a_no_op() {
    let fs = vault();
    let api = InMemoryTodoist::with_projects(hierarchy());

    sync(&fs, &api, &settings()).await;
    let second = sync(&fs, &api, &settings()).await;

    assert_eq!(second.mutation_count(), 0);
    assert!(second.folders_created.is_empty());
    assert!(second.is_clean());
}

#[tokio::test]
async fn renamed_project_moves_note_with_content() {
    let fs = vault();
    let api = InMemoryTodoist::with_projects(hierarchy());
    sync(&fs, &api, &settings()).await;

    let edited = format!("{}\n\n## Decisions\n- ship it", note_content("2", None));
    fs.insert_file("Projects/Work/Website.md", &edited);

    api.set_projects(vec![
        Project::new("1", "Work", None),
        Project::new("2", "Homepage", Some("1")),
        Project::new("3", "Launch", Some("2")),
        Project::new("4", "Home", None),
    ]);
    let report = sync(&fs, &api, &settings()).await;

    assert!(report.created.is_empty());
    assert!(report.archived.is_empty());
    assert_eq!(fs.contents("Projects/Work/Homepage.md"), Some(edited));
    assert!(fs.contents("Projects/Work/Website.md").is_none());
    // the child follows its parent into the new folder
    assert!(fs.contents("Projects/Work/Homepage/Launch.md").is_some());
    assert_eq!(report.moved.len(), 2);
}

#[tokio::test]
async fn deleted_project_is_archived_with_id_prefix() {
    let fs = vault();
    let api = InMemoryTodoist::with_projects(hierarchy());
    sync(&fs, &api, &settings()).await;

    api.set_projects(vec![
        Project::new("1", "Work", None),
        Project::new("2", "Website", Some("1")),
    ]);
    let report = sync(&fs, &api, &settings()).await;

    assert_eq!(report.archived.len(), 2);
    assert!(fs.contents("Projects/__ArchivedNotes/3-Launch.md").is_some());
    assert!(fs.contents("Projects/__ArchivedNotes/4-Home.md").is_some());
    assert!(fs.contents("Projects/Home.md").is_none());

    // archived notes are outside the index, so they stay put
    let again = sync(&fs, &api, &settings()).await;
    assert_eq!(again.mutation_count(), 0);
}

#[tokio::test]
async fn deleted_project_is_removed_with_delete_policy() {
    let fs = vault();
    let api = InMemoryTodoist::with_projects(hierarchy());
    let settings = Settings {
        deleted_project_handling: DeletedProjectHandling::Delete,
        ..settings()
    };
    sync(&fs, &api, &settings).await;

    api.set_projects(vec![Project::new("1", "Work", None)]);
    let report = sync(&fs, &api, &settings).await;

    assert_eq!(report.deleted.len(), 3);
    assert_eq!(fs.file_paths(), vec!["Projects/Work.md"]);
}

#[tokio::test]
async fn deleted_project_is_kept_with_ignore_policy() {
    let fs = vault();
    let api = InMemoryTodoist::with_projects(hierarchy());
    let settings = Settings {
        deleted_project_handling: DeletedProjectHandling::Ignore,
        ..settings()
    };
    sync(&fs, &api, &settings).await;

    api.set_projects(vec![Project::new("1", "Work", None)]);
    let report = sync(&fs, &api, &settings).await;

    assert_eq!(report.mutation_count(), 0);
    assert!(fs.contents("Projects/Home.md").is_some());
    assert!(fs.contents("Projects/Work/Website/Launch.md").is_some());
}

#[tokio::test]
async fn empty_archive_folder_still_tracks_notes() {
    let fs = vault();
    let api = InMemoryTodoist::with_projects(vec![
        Project::new("1", "Work", None),
        Project::new("4", "Home", None),
    ]);
    let settings = Settings {
        archive_folder: String::new(),
        deleted_project_handling: DeletedProjectHandling::Delete,
        ..settings()
    };
    sync(&fs, &api, &settings).await;

    api.set_projects(vec![Project::new("1", "Job", None)]);
    let report = sync(&fs, &api, &settings).await;

    assert_eq!(report.moved.len(), 1);
    assert!(report.created.is_empty());
    assert_eq!(report.deleted.len(), 1);
    assert_eq!(fs.file_paths(), vec!["Projects/Job.md"]);
}

#[tokio::test]
async fn notes_sharing_an_id_are_reported_not_touched() {
    let fs = vault();
    fs.insert_file("Projects/First.md", &note_content("42", None));
    fs.insert_file("Projects/Second.md", &note_content("42", None));
    let api = InMemoryTodoist::with_projects(vec![Project::new("42", "Answer", None)]);

    let report = sync(&fs, &api, &settings()).await;

    assert_eq!(report.mutation_count(), 0);
    assert!(matches!(
        report.conflicts.as_slice(),
        [Conflict::DuplicateId { project_id, .. }] if project_id == "42"
    ));
    assert_eq!(fs.file_paths(), vec!["Projects/First.md", "Projects/Second.md"]);
}

#[tokio::test]
async fn flat_mode_joins_names_with_separator() {
    let fs = vault();
    let api = InMemoryTodoist::with_projects(hierarchy());
    let settings = Settings {
        nested: false,
        ..settings()
    };

    let report = sync(&fs, &api, &settings).await;

    assert!(fs.contents("Projects/Work ~ Website ~ Launch.md").is_some());
    assert!(fs.contents("Projects/Work ~ Website.md").is_some());
    assert!(report.folders_created.is_empty());
    assert!(!fs.has_dir("Projects/Work"));
}

#[tokio::test]
async fn switching_to_flat_mode_moves_notes() {
    let fs = vault();
    let api = InMemoryTodoist::with_projects(hierarchy());
    sync(&fs, &api, &settings()).await;

    let flat = Settings {
        nested: false,
        separator: " - ".to_string(),
        ..settings()
    };
    let report = sync(&fs, &api, &flat).await;

    assert_eq!(report.moved.len(), 2);
    assert!(fs.contents("Projects/Work - Website - Launch.md").is_some());
}

#[tokio::test]
async fn tasks_get_a_marker_that_follows_renames() {
    let fs = vault();
    let api = InMemoryTodoist::with_projects(vec![Project::new("1", "Old Name", None)]);
    api.set_tasks(vec![Task {
        id: "t1".to_string(),
        project_id: "1".to_string(),
        content: "Write copy".to_string(),
        description: "first line\nsecond line".to_string(),
    }]);
    let settings = Settings {
        link_tasks: true,
        ..settings()
    };

    sync(&fs, &api, &settings).await;
    assert_eq!(
        api.task("t1").unwrap().description,
        "Project note: [[Old Name]]\nfirst line\nsecond line"
    );

    api.set_projects(vec![Project::new("1", "New Name", None)]);
    let report = sync(&fs, &api, &settings).await;

    assert_eq!(report.linked_tasks, vec!["t1"]);
    assert_eq!(
        api.task("t1").unwrap().description,
        "Project note: [[New Name]]\nfirst line\nsecond line"
    );
}

#[tokio::test]
async fn listing_failure_aborts_without_changes() {
    let fs = vault();
    let api = InMemoryTodoist::with_projects(hierarchy());
    api.fail_listing(true);
    let mut report = PassReport::new();

    let result = run_pass(&fs, &api, &settings(), None, &mut report).await;

    assert!(matches!(result, Err(SyncError::ProjectListing(_))));
    assert!(fs.file_paths().is_empty());
    assert!(!fs.has_dir("Projects/Work"));
    assert_eq!(report.mutation_count(), 0);
}

#[tokio::test]
async fn one_failing_note_does_not_stop_the_pass() {
    let fs = vault();
    fs.fail_on("Projects/Home.md");
    let api = InMemoryTodoist::with_projects(hierarchy());

    let report = sync(&fs, &api, &settings()).await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.created.len(), 3);
}

#[tokio::test]
async fn same_named_siblings_get_distinct_notes() {
    let fs = vault();
    let api = InMemoryTodoist::with_projects(vec![
        Project::new("1", "Work", None),
        Project::new("2", "Ideas", Some("1")),
        Project::new("3", "Ideas", Some("1")),
    ]);

    let report = sync(&fs, &api, &settings()).await;

    assert!(fs.contents("Projects/Work/Ideas.md").is_some());
    assert!(fs.contents("Projects/Work/Ideas (3).md").is_some());
    assert_eq!(report.warnings.len(), 1);

    let again = sync(&fs, &api, &settings()).await;
    assert_eq!(again.mutation_count(), 0);
}

#[tokio::test]
async fn vault_root_as_note_folder() {
    let fs = InMemoryFs::new();
    fs.insert_file("Daily/2024-01-01.md", "# journal");
    let api = InMemoryTodoist::with_projects(vec![Project::new("1", "Work", None)]);
    let settings = Settings {
        note_folder: "/".to_string(),
        ..settings()
    };

    let report = sync(&fs, &api, &settings).await;

    assert_eq!(report.created, vec!["Work.md"]);
    assert_eq!(fs.contents("Daily/2024-01-01.md").as_deref(), Some("# journal"));
}

#[tokio::test]
async fn returned_index_can_drive_the_next_pass() {
    let fs = vault();
    let api = InMemoryTodoist::with_projects(hierarchy());
    let mut report = PassReport::new();

    let index: NoteIndex = run_pass(&fs, &api, &settings(), None, &mut report).await.unwrap();
    assert_eq!(index.len(), 4);

    let mut second = PassReport::new();
    run_pass(&fs, &api, &settings(), Some(index), &mut second)
        .await
        .unwrap();
    assert_eq!(second.mutation_count(), 0);
}
