//! On-load upgrade of persisted tasks.
//!
//! Older data stored a single `description` string per task. Tasks without a
//! `descriptionEntries` field get one entry synthesized from that string. The
//! legacy field is kept so older readers keep working.

use serde::Deserialize;
use time::OffsetDateTime;

use crate::id::{GroupId, TagId, TaskId};
use crate::model::{DescriptionEntry, Subtask, Task};

/// Task as found in the store, before migration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTask {
    id: TaskId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    description_entries: Option<Vec<DescriptionEntry>>,
    #[serde(default)]
    group_id: Option<GroupId>,
    #[serde(default)]
    completed: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    completed_at: Option<OffsetDateTime>,
    #[serde(default)]
    subtasks: Vec<Subtask>,
    #[serde(default)]
    tags: Vec<TagId>,
    #[serde(default)]
    order: i64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
}

impl StoredTask {
    /// Whether this task still uses the legacy description shape.
    #[must_use]
    pub const fn is_legacy(&self) -> bool {
        self.description_entries.is_none()
    }

    /// Convert into the current task shape.
    #[must_use]
    pub fn migrate(self) -> Task {
        let created_at = self.created_at.unwrap_or_else(OffsetDateTime::now_utc);
        let description = self.description.unwrap_or_default();
        let description_entries = self.description_entries.unwrap_or_else(|| {
            if description.is_empty() {
                Vec::new()
            } else {
                vec![DescriptionEntry::new(description.clone(), created_at)]
            }
        });
        Task {
            id: self.id,
            title: self.title,
            description,
            description_entries,
            group_id: self.group_id,
            completed: self.completed,
            completed_at: self.completed_at,
            subtasks: self.subtasks,
            tags: self.tags,
            order: self.order,
            created_at,
        }
    }
}

/// Migrate a stored task list, returning the tasks and how many were upgraded.
#[must_use]
pub fn migrate_tasks(stored: Vec<StoredTask>) -> (Vec<Task>, usize) {
    let upgraded = stored.iter().filter(|task| task.is_legacy()).count();
    let tasks = stored.into_iter().map(StoredTask::migrate).collect();
    (tasks, upgraded)
}
