use serde::{Deserialize, Serialize};

/// A task as stored by the remote task service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub remaining_seconds: Option<i64>,
    #[serde(default)]
    pub is_completed: bool,
}

impl Task {
    /// A fresh, uncompleted task with a generated `task-<uuid>` id.
    pub fn new(title: &str, duration_seconds: i64) -> Self {
        Task {
            id: Some(format!("task-{}", uuid::Uuid::new_v4())),
            title: Some(title.to_string()),
            duration_seconds: Some(duration_seconds),
            remaining_seconds: Some(duration_seconds),
            is_completed: false,
        }
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => crate::stack::UNTITLED,
        }
    }

    pub fn duration(&self) -> i64 {
        self.duration_seconds.unwrap_or(0)
    }

    /// Remaining time, falling back to the full duration when never started.
    pub fn remaining(&self) -> i64 {
        self.remaining_seconds.unwrap_or_else(|| self.duration()).max(0)
    }
}

/// Partial update; only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl TaskPatch {
    pub fn remaining(seconds: i64) -> Self {
        TaskPatch {
            remaining_seconds: Some(seconds),
            ..Default::default()
        }
    }

    pub fn completed() -> Self {
        TaskPatch {
            is_completed: Some(true),
            remaining_seconds: Some(0),
            ..Default::default()
        }
    }

    /// Puts a finished task back on the active list with its full time.
    pub fn restored(task: &Task) -> Self {
        TaskPatch {
            is_completed: Some(false),
            remaining_seconds: Some(task.duration()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigItem {
    pub key_name: String,
    pub value: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupMode {
    None,
    AddTask,
}
