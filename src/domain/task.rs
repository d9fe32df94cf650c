//! Task and Subtask Entities
//!
//! Tasks are the items of the board and calendar views: `status` is the
//! board column identity, `due_date` the calendar cell identity and
//! `position` the 0-based ordinal within the owning container. Subtasks
//! are ordered within their parent task.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub order_id: String,
    pub title: String,
    pub status: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub position: i32,
    #[serde(default)]
    pub assignees: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_on: Option<DateTime<Utc>>,
}

impl Entity for Task {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub task_id: String,
    pub title: String,
    #[serde(default)]
    pub done: bool,
    pub position: i32,
    #[serde(default)]
    pub assignees: Vec<String>,
}

impl Entity for Subtask {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

/// Subtasks reorder within their parent task list
impl worksync_dnd::Sortable for Subtask {
    fn sort_id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> i32 {
        self.position
    }

    fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    fn container_key(&self) -> &str {
        &self.task_id
    }

    fn set_container_key(&mut self, key: &str) {
        self.task_id = key.to_string();
    }
}
