//! Remote project/task model and the Todoist API abstraction.
//!
//! Implementations:
//! - `InMemoryTodoist` - For testing
//! - `TodoistClient` (in project-notes) - REST client over reqwest

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    Decode(String),
}

/// A remote project, one node of the project hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Parent project id; `None` for top-level projects
    #[serde(default, deserialize_with = "empty_as_none")]
    pub parent_id: Option<String>,
}

impl Project {
    pub fn new(id: &str, name: &str, parent_id: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
        }
    }
}

/// A remote task. Only the fields the task linker touches are modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    /// Task title
    pub content: String,
    /// Free-text description (may be empty)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// The slice of the Todoist API the engine consumes.
///
/// Any `Err` is terminal for the step that issued the call.
#[async_trait]
pub trait TodoistApi: Send + Sync {
    /// All projects visible to the account, in listing order
    async fn list_projects(&self) -> Result<Vec<Project>, RemoteError>;

    /// All active tasks
    async fn list_tasks(&self) -> Result<Vec<Task>, RemoteError>;

    /// Replace a task's description
    async fn update_task_description(&self, task_id: &str, description: &str)
        -> Result<(), RemoteError>;
}

/// In-memory Todoist account for testing
#[derive(Default)]
pub struct InMemoryTodoist {
    projects: RwLock<Vec<Project>>,
    tasks: RwLock<Vec<Task>>,
    fail_listing: RwLock<bool>,
    failing_tasks: RwLock<HashSet<String>>,
    updates: RwLock<Vec<(String, String)>>,
}

impl InMemoryTodoist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects(projects: Vec<Project>) -> Self {
        let api = Self::new();
        api.set_projects(projects);
        api
    }

    pub fn set_projects(&self, projects: Vec<Project>) {
        *self.projects.write().unwrap() = projects;
    }

    pub fn set_tasks(&self, tasks: Vec<Task>) {
        *self.tasks.write().unwrap() = tasks;
    }

    /// Make both listing calls fail (simulates a bad API key or no network)
    pub fn fail_listing(&self, fail: bool) {
        *self.fail_listing.write().unwrap() = fail;
    }

    /// Make updates to one task fail
    pub fn fail_task_update(&self, task_id: &str) {
        self.failing_tasks.write().unwrap().insert(task_id.to_string());
    }

    /// Successful description updates, in call order
    pub fn updates(&self) -> Vec<(String, String)> {
        self.updates.read().unwrap().clone()
    }

    /// Current state of a task
    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.tasks
            .read()
            .unwrap()
            .iter()
            .find(|t| t.id == task_id)
            .cloned()
    }

    fn check_listing(&self) -> Result<(), RemoteError> {
        if *self.fail_listing.read().unwrap() {
            return Err(RemoteError::Status {
                status: 401,
                body: "Unauthorized".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TodoistApi for InMemoryTodoist {
    async fn list_projects(&self) -> Result<Vec<Project>, RemoteError> {
        self.check_listing()?;
        Ok(self.projects.read().unwrap().clone())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, RemoteError> {
        self.check_listing()?;
        Ok(self.tasks.read().unwrap().clone())
    }

    async fn update_task_description(
        &self,
        task_id: &str,
        description: &str,
    ) -> Result<(), RemoteError> {
        if self.failing_tasks.read().unwrap().contains(task_id) {
            return Err(RemoteError::Transport(format!("connection reset ({})", task_id)));
        }

        let mut tasks = self.tasks.write().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| RemoteError::Status {
                status: 404,
                body: format!("Task {} not found", task_id),
            })?;
        task.description = description.to_string();
        self.updates
            .write()
            .unwrap()
            .push((task_id.to_string(), description.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_deserializes_null_and_empty_parent_as_root() {
        let projects: Vec<Project> = serde_json::from_str(
            r#"[
                {"id": "1", "name": "Work", "parent_id": null, "color": "red"},
                {"id": "2", "name": "Home", "parent_id": ""},
                {"id": "3", "name": "Website", "parent_id": "1"},
                {"id": "4", "name": "Inbox"}
            ]"#,
        )
        .unwrap();

        assert_eq!(projects[0].parent_id, None);
        assert_eq!(projects[1].parent_id, None);
        assert_eq!(projects[2].parent_id.as_deref(), Some("1"));
        assert_eq!(projects[3].parent_id, None);
    }

    #[test]
    fn task_deserializes_missing_description() {
        let task: Task = serde_json::from_str(
            r#"{"id": "9", "project_id": "1", "content": "Ship it", "description": null}"#,
        )
        .unwrap();
        assert_eq!(task.description, "");
    }

    #[tokio::test]
    async fn in_memory_records_updates() {
        let api = InMemoryTodoist::new();
        api.set_tasks(vec![Task {
            id: "9".into(),
            project_id: "1".into(),
            content: "Ship it".into(),
            description: String::new(),
        }]);

        api.update_task_description("9", "hello").await.unwrap();

        assert_eq!(api.task("9").unwrap().description, "hello");
        assert_eq!(api.updates(), vec![("9".to_string(), "hello".to_string())]);
        assert!(api.update_task_description("missing", "x").await.is_err());
    }
}
