//! Target note paths for every reachable project.
//!
//! Paths are computed level by level from the roots. In nested mode the
//! folders for one level are created before the next level is planned, so
//! every note's parent folder exists by the time the reconciler runs.

use std::collections::HashMap;

use obsidian_fs::join_path;
use tracing::debug;

use crate::fs::FileSystem;
use crate::report::{Operation, PassReport};
use crate::settings::Naming;
use crate::tree::ProjectTree;

/// Planned note path (normalized, without `.md`) per project id.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NotePaths {
    paths: HashMap<String, String>,
}

impl NotePaths {
    pub fn get(&self, project_id: &str) -> Option<&str> {
        self.paths.get(project_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.paths.iter()
    }
}

/// Path of a project relative to the note root, given its parent's.
fn compose(naming: &Naming, parent: Option<&str>, name: &str) -> String {
    match (naming, parent) {
        (_, None) => name.to_string(),
        (Naming::Nested, Some(parent)) => format!("{}/{}", parent, name),
        (Naming::Flat { separator }, Some(parent)) => format!("{}{}{}", parent, separator, name),
    }
}

/// Plan every reachable project's note path and create nested-mode folders.
///
/// Two projects that would share a path (identically named siblings, or a
/// flat-mode name that happens to contain the separator) are disambiguated:
/// the first in breadth-first order keeps the plain name, later ones get
/// `<name> (<id>)`. Folder creation failures are reported and planning
/// continues; notes below that folder will fail individually.
pub async fn plan_paths<F: FileSystem>(
    fs: &F,
    tree: &ProjectTree,
    naming: &Naming,
    root: &str,
    report: &mut PassReport,
) -> NotePaths {
    let mut relative: HashMap<&str, String> = HashMap::with_capacity(tree.len());
    let mut claimed: HashMap<String, &str> = HashMap::with_capacity(tree.len());
    let mut planned = NotePaths::default();

    for level in tree.levels() {
        let mut containers = Vec::new();

        for project in level {
            let parent = project
                .parent_id
                .as_deref()
                .and_then(|id| relative.get(id))
                .map(String::as_str);

            let mut rel = compose(naming, parent, &project.name);
            let mut full = join_path(&[root, &rel]);
            let mut attempt = 1;
            while let Some(owner) = claimed.get(&full) {
                let suffix = if attempt == 1 {
                    format!("{} ({})", project.name, project.id)
                } else {
                    format!("{} ({}) {}", project.name, project.id, attempt)
                };
                report.record_warning(format!(
                    "Project '{}' ({}) would share the note '{}' with project {}; using '{}' instead",
                    project.name, project.id, full, owner, suffix
                ));
                rel = compose(naming, parent, &suffix);
                full = join_path(&[root, &rel]);
                attempt += 1;
            }

            debug!("Planned {} -> {}", project.id, full);
            claimed.insert(full.clone(), project.id.as_str());
            if *naming == Naming::Nested && tree.has_children(&project.id) {
                containers.push(full.clone());
            }
            relative.insert(project.id.as_str(), rel);
            planned.paths.insert(project.id.clone(), full);
        }

        for folder in containers {
            ensure_folder(fs, &folder, report).await;
        }
    }

    planned
}

async fn ensure_folder<F: FileSystem>(fs: &F, path: &str, report: &mut PassReport) {
    match fs.exists(path).await {
        Ok(true) => {}
        Ok(false) => match fs.mkdir(path).await {
            Ok(()) => report.record_folder(path),
            Err(e) => report.record_failure(Operation::CreateFolder, path, e),
        },
        Err(e) => report.record_failure(Operation::CreateFolder, path, e),
    }
}
