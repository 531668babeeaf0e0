use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::id::{EntryId, GroupId, MoodId, NoteId, SongId, SubtaskId, TagId, TaskId};

/// User-defined bucket that tasks may belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Identifier of the group.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Group {
    /// Create a group stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GroupId::new(),
            name: name.into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// A single dated paragraph of a task description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionEntry {
    /// Identifier of the entry.
    pub id: EntryId,
    /// Entry body.
    pub text: String,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Timestamp of the last edit, if any.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub edited_at: Option<OffsetDateTime>,
}

impl DescriptionEntry {
    /// Create an entry stamped with the given creation time.
    #[must_use]
    pub fn new(text: impl Into<String>, created_at: OffsetDateTime) -> Self {
        Self {
            id: EntryId::new(),
            text: text.into(),
            created_at,
            edited_at: None,
        }
    }
}

/// Checklist item owned by a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    /// Identifier of the subtask.
    pub id: SubtaskId,
    /// Display title.
    pub title: String,
    /// Whether the subtask is done.
    #[serde(default)]
    pub completed: bool,
}

/// Planner task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Identifier of the task.
    pub id: TaskId,
    /// Display title.
    pub title: String,
    /// Legacy single-string description, kept for older readers.
    #[serde(default)]
    pub description: String,
    /// Description history, newest first.
    #[serde(default)]
    pub description_entries: Vec<DescriptionEntry>,
    /// Owning group; `None` means ungrouped.
    #[serde(default)]
    pub group_id: Option<GroupId>,
    /// Completion flag.
    #[serde(default)]
    pub completed: bool,
    /// Completion timestamp.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    /// Ordered checklist.
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Attached tag identifiers.
    #[serde(default)]
    pub tags: Vec<TagId>,
    /// Position within the task's (group, completed) partition.
    #[serde(default)]
    pub order: i64,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Task {
    /// Create an active task with no subtasks, tags or description.
    #[must_use]
    pub fn new(title: impl Into<String>, group_id: Option<GroupId>, order: i64) -> Self {
        Self {
            id: TaskId::new(),
            title: title.into(),
            description: String::new(),
            description_entries: Vec::new(),
            group_id,
            completed: false,
            completed_at: None,
            subtasks: Vec::new(),
            tags: Vec::new(),
            order,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Whether the task belongs to `group` (`None` matches ungrouped tasks).
    #[must_use]
    pub fn in_group(&self, group: Option<&GroupId>) -> bool {
        self.group_id.as_ref() == group
    }
}

/// Colored label attachable to tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Identifier of the tag.
    pub id: TagId,
    /// Display name.
    pub name: String,
    /// CSS-style color string.
    pub color: String,
}

/// Free-form note, convertible into a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Identifier of the note.
    pub id: NoteId,
    /// Display title.
    pub title: String,
    /// Note body.
    #[serde(default)]
    pub content: String,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Named, colored playlist bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mood {
    /// Identifier of the mood.
    pub id: MoodId,
    /// Display name.
    pub name: String,
    /// CSS-style color string.
    pub color: String,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Local audio file registered in the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    /// Identifier of the song.
    pub id: SongId,
    /// Absolute path of the audio file.
    pub file_path: String,
    /// Track title.
    pub title: String,
    /// Track artist.
    pub artist: String,
    /// Album name.
    pub album: String,
    /// Length in seconds (0 when unknown).
    #[serde(default)]
    pub duration: f64,
    /// Owning mood; `None` means unsorted.
    #[serde(default)]
    pub mood_id: Option<MoodId>,
    /// Timestamp the song was added.
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
}
