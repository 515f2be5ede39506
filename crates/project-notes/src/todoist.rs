//! Todoist REST API client.

use async_trait::async_trait;
use project_sync::{Project, RemoteError, Task, TodoistApi};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Todoist REST API root
pub const DEFAULT_BASE_URL: &str = "https://api.todoist.com/rest/v2";

/// Body of a task update that only touches the description
#[derive(Debug, Serialize)]
struct DescriptionUpdate<'a> {
    description: &'a str,
}

/// Bearer-token client for the projects and tasks endpoints.
pub struct TodoistClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TodoistClient {
    pub fn new(token: &str) -> Result<Self, RemoteError> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .user_agent(concat!("project-notes/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

/// Turn a non-success response into `RemoteError::Status` with its body.
async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl TodoistApi for TodoistClient {
    async fn list_projects(&self) -> Result<Vec<Project>, RemoteError> {
        self.get_json("projects").await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, RemoteError> {
        self.get_json("tasks").await
    }

    async fn update_task_description(
        &self,
        task_id: &str,
        description: &str,
    ) -> Result<(), RemoteError> {
        let url = self.url(&format!("tasks/{}", task_id));
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&DescriptionUpdate { description })
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }
}
