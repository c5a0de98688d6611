use reqwest::{Client, StatusCode, Url};
use thiserror::Error;

use crate::models::{Task, TaskPatch};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{op} failed: {status} {body}")]
    Status {
        op: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("invalid API base URL: {0}")]
    InvalidBase(String),

    #[error("invalid task payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for the per-user task collection at `{base}/users/{user}/tasks`.
#[derive(Clone)]
pub struct TasksApi {
    client: Client,
    base: Url,
}

impl TasksApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|e| ApiError::InvalidBase(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBase(base_url.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    fn tasks_url(&self, username: &str, task_id: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidBase(self.base.to_string()))?;
            segments.pop_if_empty().extend(["users", username, "tasks"]);
            if let Some(id) = task_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn check(op: &'static str, response: reqwest::Response) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            log::warn!("{} failed with {}", op, status);
            return Err(ApiError::Status { op, status, body });
        }
        Ok(body)
    }

    /// Lists a user's tasks, optionally only completed (`Some(true)`) or
    /// active (`Some(false)`) ones.
    pub async fn get_tasks(&self, username: &str, completed: Option<bool>) -> Result<Vec<Task>, ApiError> {
        let mut url = self.tasks_url(username, None)?;
        if let Some(completed) = completed {
            url.query_pairs_mut()
                .append_pair("completed", if completed { "true" } else { "false" });
        }

        let response = self.client.get(url).send().await?;
        let body = Self::check("GET tasks", response).await?;
        let tasks: Vec<Task> = serde_json::from_str(&body)?;
        log::debug!("loaded {} tasks for {}", tasks.len(), username);
        Ok(tasks)
    }

    pub async fn create_task(&self, username: &str, task: &Task) -> Result<(), ApiError> {
        let url = self.tasks_url(username, None)?;
        let response = self.client.post(url).json(task).send().await?;
        Self::check("Create", response).await?;
        Ok(())
    }

    pub async fn update_task(&self, username: &str, task_id: &str, patch: &TaskPatch) -> Result<(), ApiError> {
        let url = self.tasks_url(username, Some(task_id))?;
        let response = self.client.patch(url).json(patch).send().await?;
        Self::check("Update", response).await?;
        Ok(())
    }

    pub async fn delete_task(&self, username: &str, task_id: &str) -> Result<(), ApiError> {
        let url = self.tasks_url(username, Some(task_id))?;
        let response = self.client.delete(url).send().await?;
        Self::check("Delete", response).await?;
        Ok(())
    }
}
