//! Typed partial updates.
//!
//! Every patch replaces the fields that are present and leaves the rest
//! untouched. `apply` is pure with respect to everything except the target.

use time::OffsetDateTime;

use crate::focus::FocusTimer;
use crate::id::{GroupId, MoodId, TagId};
use crate::model::{Group, Mood, Note, Song, Subtask, Tag, Task};

/// Patch for a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPatch {
    /// New display name.
    pub name: Option<String>,
}

impl GroupPatch {
    /// Returns true when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
    }

    /// Apply the patch to `group`.
    pub fn apply(self, group: &mut Group) {
        if let Some(name) = self.name {
            group.name = name;
        }
    }
}

/// Patch for a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,
    /// New legacy description.
    pub description: Option<String>,
    /// New group; `Some(None)` detaches the task.
    pub group_id: Option<Option<GroupId>>,
    /// New completion flag.
    pub completed: Option<bool>,
    /// Replacement tag list.
    pub tags: Option<Vec<TagId>>,
}

/// Outcome of applying a [`TaskPatch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskPatchEffect {
    /// The completion flag changed.
    pub completion_flipped: bool,
    /// The owning group changed.
    pub group_changed: bool,
}

impl TaskPatchEffect {
    /// Whether the task must be moved to another partition.
    #[must_use]
    pub const fn repartition(self) -> bool {
        self.completion_flipped || self.group_changed
    }
}

impl TaskPatch {
    /// Returns true when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.group_id.is_none()
            && self.completed.is_none()
            && self.tags.is_none()
    }

    /// Apply the patch to `task`, stamping `completed_at` when the completion flag flips.
    pub fn apply(self, task: &mut Task, now: OffsetDateTime) -> TaskPatchEffect {
        let mut effect = TaskPatchEffect::default();
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(group_id) = self.group_id {
            effect.group_changed = task.group_id != group_id;
            task.group_id = group_id;
        }
        if let Some(completed) = self.completed
            && completed != task.completed
        {
            effect.completion_flipped = true;
            task.completed = completed;
            task.completed_at = completed.then_some(now);
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        effect
    }
}

/// Patch for a subtask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtaskPatch {
    /// New title.
    pub title: Option<String>,
    /// New completion flag.
    pub completed: Option<bool>,
}

impl SubtaskPatch {
    /// Apply the patch, returning true when the subtask became completed.
    pub fn apply(self, subtask: &mut Subtask) -> bool {
        if let Some(title) = self.title {
            subtask.title = title;
        }
        match self.completed {
            Some(completed) => {
                let newly = completed && !subtask.completed;
                subtask.completed = completed;
                newly
            }
            None => false,
        }
    }
}

/// Patch for a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPatch {
    /// New name.
    pub name: Option<String>,
    /// New color.
    pub color: Option<String>,
}

impl TagPatch {
    /// Apply the patch to `tag`.
    pub fn apply(self, tag: &mut Tag) {
        if let Some(name) = self.name {
            tag.name = name;
        }
        if let Some(color) = self.color {
            tag.color = color;
        }
    }
}

/// Patch for a note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    /// New title; an empty title keeps the previous one.
    pub title: Option<String>,
    /// New body.
    pub content: Option<String>,
}

impl NotePatch {
    /// Apply the patch to `note`.
    pub fn apply(self, note: &mut Note) {
        if let Some(title) = self.title.filter(|title| !title.trim().is_empty()) {
            note.title = title;
        }
        if let Some(content) = self.content {
            note.content = content;
        }
    }
}

/// Patch for a mood.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoodPatch {
    /// New name.
    pub name: Option<String>,
    /// New color.
    pub color: Option<String>,
}

impl MoodPatch {
    /// Apply the patch to `mood`.
    pub fn apply(self, mood: &mut Mood) {
        if let Some(name) = self.name {
            mood.name = name;
        }
        if let Some(color) = self.color {
            mood.color = color;
        }
    }
}

/// Patch for a song.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongPatch {
    /// New file path.
    pub file_path: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// New artist.
    pub artist: Option<String>,
    /// New album.
    pub album: Option<String>,
    /// New duration in seconds.
    pub duration: Option<f64>,
    /// New mood; `Some(None)` moves the song to unsorted.
    pub mood_id: Option<Option<MoodId>>,
}

impl SongPatch {
    /// Apply the patch to `song`.
    pub fn apply(self, song: &mut Song) {
        if let Some(file_path) = self.file_path {
            song.file_path = file_path;
        }
        if let Some(title) = self.title {
            song.title = title;
        }
        if let Some(artist) = self.artist {
            song.artist = artist;
        }
        if let Some(album) = self.album {
            song.album = album;
        }
        if let Some(duration) = self.duration.filter(|d| d.is_finite()) {
            song.duration = duration.max(0.0);
        }
        if let Some(mood_id) = self.mood_id {
            song.mood_id = mood_id;
        }
    }
}

/// Patch for the focus timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusTimerPatch {
    /// New total length in seconds.
    pub duration: Option<u64>,
    /// New remaining time in seconds.
    pub time_left: Option<u64>,
    /// Pause or resume.
    pub is_running: Option<bool>,
}

impl FocusTimerPatch {
    /// Apply the patch to `timer`.
    pub const fn apply(self, timer: &mut FocusTimer) {
        if let Some(duration) = self.duration {
            timer.duration = duration;
        }
        if let Some(time_left) = self.time_left {
            timer.time_left = time_left;
        }
        if let Some(is_running) = self.is_running {
            timer.is_running = is_running;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{NoteId, SongId};

    #[test]
    fn task_patch_stamps_completion() {
        let now = OffsetDateTime::now_utc();
        let mut task = Task::new("Write report", None, 0);
        let effect = TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        }
        .apply(&mut task, now);
        assert!(effect.completion_flipped);
        assert!(!effect.group_changed);
        assert_eq!(task.completed_at, Some(now));

        let effect = TaskPatch {
            completed: Some(false),
            ..TaskPatch::default()
        }
        .apply(&mut task, now);
        assert!(effect.repartition());
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn task_patch_without_flip_keeps_timestamp() {
        let now = OffsetDateTime::now_utc();
        let mut task = Task::new("Write report", None, 0);
        let effect = TaskPatch {
            title: Some("Send report".into()),
            completed: Some(false),
            ..TaskPatch::default()
        }
        .apply(&mut task, now);
        assert!(!effect.repartition());
        assert_eq!(task.title, "Send report");
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn task_patch_detects_group_change() {
        let group = GroupId::new();
        let mut task = Task::new("Write report", Some(group.clone()), 0);
        let same = TaskPatch {
            group_id: Some(Some(group)),
            ..TaskPatch::default()
        }
        .apply(&mut task, OffsetDateTime::now_utc());
        assert!(!same.group_changed);

        let detached = TaskPatch {
            group_id: Some(None),
            ..TaskPatch::default()
        }
        .apply(&mut task, OffsetDateTime::now_utc());
        assert!(detached.group_changed);
        assert!(task.group_id.is_none());
    }

    #[test]
    fn subtask_patch_reports_new_completion_only() {
        let mut subtask = Subtask {
            id: crate::id::SubtaskId::new(),
            title: "step".into(),
            completed: false,
        };
        let done = SubtaskPatch {
            completed: Some(true),
            ..SubtaskPatch::default()
        };
        assert!(done.clone().apply(&mut subtask));
        assert!(!done.apply(&mut subtask));
    }

    #[test]
    fn note_patch_ignores_blank_title() {
        let mut note = Note {
            id: NoteId::new(),
            title: "Groceries".into(),
            content: String::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        NotePatch {
            title: Some("  ".into()),
            content: Some("milk".into()),
        }
        .apply(&mut note);
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "milk");
    }

    #[test]
    fn empty_patches_report_empty() {
        assert!(TaskPatch::default().is_empty());
        assert!(GroupPatch::default().is_empty());
        assert!(
            !TaskPatch {
                tags: Some(Vec::new()),
                ..TaskPatch::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn song_patch_drops_non_finite_durations() {
        let mut song = Song {
            id: SongId::new(),
            file_path: "/music/a.mp3".into(),
            title: "A".into(),
            artist: "B".into(),
            album: "C".into(),
            duration: 120.0,
            mood_id: None,
            added_at: OffsetDateTime::now_utc(),
        };
        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            SongPatch {
                duration: Some(bad),
                ..SongPatch::default()
            }
            .apply(&mut song);
        }
        assert!((song.duration - 120.0).abs() < f64::EPSILON);

        let json = serde_json::to_value(&song).unwrap_or_else(|err| panic!("serialize: {err}"));
        let back: Song = serde_json::from_value(json).unwrap_or_else(|err| panic!("reload: {err}"));
        assert_eq!(back, song);
    }
}
