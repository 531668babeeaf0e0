//! Planner state and its reducers.
//!
//! Every mutating method runs to completion against the owned collections
//! and reports what must be persisted and notified through [`Changes`].
//! Unknown identifiers make the call a no-op that returns empty changes.

use time::OffsetDateTime;

use crate::change::{Bucket, Changes, Notice};
use crate::id::{EntryId, GroupId, NoteId, SubtaskId, TagId, TaskId};
use crate::model::{DescriptionEntry, Group, Note, Subtask, Tag, Task};
use crate::ordering::{self, TaskMove};
use crate::patch::{GroupPatch, NotePatch, SubtaskPatch, TagPatch, TaskPatch};
use crate::text_matcher::TextMatcher;

/// Title given to notes created without one.
pub const DEFAULT_NOTE_TITLE: &str = "New note";
/// Title given to tasks converted from an untitled note.
pub const DEFAULT_TASK_TITLE: &str = "New task";

/// In-memory planner collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannerState {
    groups: Vec<Group>,
    tasks: Vec<Task>,
    tags: Vec<Tag>,
    notes: Vec<Note>,
    archived_tasks: Vec<Task>,
}

impl PlannerState {
    /// Build a state from loaded collections, normalizing task orders.
    #[must_use]
    pub fn from_parts(
        groups: Vec<Group>,
        tasks: Vec<Task>,
        tags: Vec<Tag>,
        notes: Vec<Note>,
        archived_tasks: Vec<Task>,
    ) -> Self {
        Self {
            groups,
            tasks: ordering::normalize(tasks),
            tags,
            notes,
            archived_tasks,
        }
    }

    /// Groups in display order.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// All live tasks, laid out group by group, active before completed.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Tags.
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Notes.
    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Archived tasks, oldest archive first.
    #[must_use]
    pub fn archived_tasks(&self) -> &[Task] {
        &self.archived_tasks
    }

    /// Look up a group.
    #[must_use]
    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        self.groups.iter().find(|group| &group.id == id)
    }

    /// Look up a task.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Look up a note.
    #[must_use]
    pub fn note(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    /// Tasks of one group (`None` for ungrouped), active first.
    #[must_use]
    pub fn group_tasks(&self, group: Option<&GroupId>) -> Vec<&Task> {
        self.tasks.iter().filter(|task| task.in_group(group)).collect()
    }

    /// Tasks whose text fields contain `query`; a blank query matches everything.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Task> {
        let Some(matcher) = TextMatcher::new(query) else {
            return self.tasks.iter().collect();
        };
        self.tasks
            .iter()
            .filter(|task| matcher.matches(task, &self.tags))
            .collect()
    }

    fn task_index(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }

    fn renumber(&mut self) {
        self.tasks = ordering::renumber(std::mem::take(&mut self.tasks));
    }

    // Groups

    /// Append a new group.
    pub fn add_group(&mut self, name: impl Into<String>) -> (GroupId, Changes) {
        let group = Group::new(name);
        let id = group.id.clone();
        self.groups.push(group);
        (id, Changes::touching(&[Bucket::Groups]))
    }

    /// Rename a group.
    pub fn update_group(&mut self, id: &GroupId, patch: GroupPatch) -> Changes {
        let Some(group) = self.groups.iter_mut().find(|group| &group.id == id) else {
            return Changes::none();
        };
        patch.apply(group);
        Changes::touching(&[Bucket::Groups]).with_group(Some(id.clone()))
    }

    /// Delete a group, detaching its tasks into the ungrouped bucket.
    pub fn delete_group(&mut self, id: &GroupId) -> Changes {
        let Some(index) = self.groups.iter().position(|group| &group.id == id) else {
            return Changes::none();
        };
        self.groups.remove(index);
        let mut detached = false;
        for task in self.tasks.iter_mut().filter(|task| task.in_group(Some(id))) {
            task.group_id = None;
            detached = true;
        }
        let mut changes = Changes::touching(&[Bucket::Groups]);
        if detached {
            self.renumber();
            changes.merge(
                Changes::touching(&[Bucket::Tasks])
                    .with_group(Some(id.clone()))
                    .with_group(None),
            );
        }
        changes
    }

    /// Reorder groups by list splice.
    pub fn move_group(&mut self, source_index: usize, dest_index: usize) -> Changes {
        if ordering::splice_move(&mut self.groups, source_index, dest_index) {
            Changes::touching(&[Bucket::Groups])
        } else {
            Changes::none()
        }
    }

    // Tasks

    /// Add an active task at the end of its group's active partition.
    pub fn add_task(&mut self, group: Option<GroupId>, title: impl Into<String>) -> (TaskId, Changes) {
        let order = ordering::active_count(&self.tasks, group.as_ref());
        let task = Task::new(title, group.clone(), i64::try_from(order).unwrap_or(i64::MAX));
        let id = task.id.clone();
        self.tasks.push(task);
        self.renumber();
        (id, Changes::touching(&[Bucket::Tasks]).with_group(group))
    }

    /// Apply a patch to a task, re-partitioning it when its group or completion changed.
    pub fn update_task(&mut self, id: &TaskId, patch: TaskPatch) -> Changes {
        let Some(index) = self.task_index(id) else {
            return Changes::none();
        };
        let previous_group = self.tasks[index].group_id.clone();
        let effect = patch.apply(&mut self.tasks[index], OffsetDateTime::now_utc());
        let group = self.tasks[index].group_id.clone();
        if effect.repartition() {
            self.tasks = ordering::relocate_to_partition_tail(std::mem::take(&mut self.tasks), index);
        }
        Changes::touching(&[Bucket::Tasks])
            .with_group(previous_group)
            .with_group(group)
    }

    /// Mark a task completed and move it to the tail of its completed partition.
    pub fn complete_task(&mut self, id: &TaskId) -> Changes {
        let Some(index) = self.task_index(id) else {
            return Changes::none();
        };
        let task = &mut self.tasks[index];
        if task.completed {
            return Changes::none();
        }
        task.completed = true;
        task.completed_at = Some(OffsetDateTime::now_utc());
        let group = task.group_id.clone();
        self.tasks = ordering::relocate_to_partition_tail(std::mem::take(&mut self.tasks), index);
        Changes::touching(&[Bucket::Tasks])
            .with_group(group.clone())
            .with_notice(Notice::TaskCompleted {
                task: id.clone(),
                group,
            })
    }

    /// Reactivate a task, placing it just before the first completed task of its group.
    pub fn uncomplete_task(&mut self, id: &TaskId) -> Changes {
        let Some(index) = self.task_index(id) else {
            return Changes::none();
        };
        let task = &mut self.tasks[index];
        if !task.completed {
            return Changes::none();
        }
        task.completed = false;
        task.completed_at = None;
        let group = task.group_id.clone();
        self.tasks = ordering::relocate_to_partition_tail(std::mem::take(&mut self.tasks), index);
        Changes::touching(&[Bucket::Tasks]).with_group(group)
    }

    /// Delete a task and close the gap it leaves.
    pub fn delete_task(&mut self, id: &TaskId) -> Changes {
        let Some(index) = self.task_index(id) else {
            return Changes::none();
        };
        let task = self.tasks.remove(index);
        self.renumber();
        Changes::touching(&[Bucket::Tasks]).with_group(task.group_id)
    }

    /// Drag-and-drop move of a task within or across groups.
    pub fn move_task(&mut self, request: &TaskMove) -> Changes {
        let Some(tasks) = ordering::move_task(self.tasks.clone(), request) else {
            return Changes::none();
        };
        self.tasks = tasks;
        Changes::touching(&[Bucket::Tasks])
            .with_group(request.source_group.clone())
            .with_group(request.dest_group.clone())
    }

    /// Prepend a description entry (newest first).
    pub fn add_description_entry(&mut self, task: &TaskId, text: impl Into<String>) -> (Option<EntryId>, Changes) {
        let Some(task) = self.tasks.iter_mut().find(|t| &t.id == task) else {
            return (None, Changes::none());
        };
        let entry = DescriptionEntry::new(text, OffsetDateTime::now_utc());
        let id = entry.id.clone();
        task.description_entries.insert(0, entry);
        let changes = Changes::touching(&[Bucket::Tasks]).with_group(task.group_id.clone());
        (Some(id), changes)
    }

    /// Replace the text of a description entry and stamp the edit time.
    pub fn edit_description_entry(&mut self, task: &TaskId, entry: &EntryId, text: impl Into<String>) -> Changes {
        let Some(task) = self.tasks.iter_mut().find(|t| &t.id == task) else {
            return Changes::none();
        };
        let Some(slot) = task.description_entries.iter_mut().find(|e| &e.id == entry) else {
            return Changes::none();
        };
        slot.text = text.into();
        slot.edited_at = Some(OffsetDateTime::now_utc());
        Changes::touching(&[Bucket::Tasks]).with_group(task.group_id.clone())
    }

    // Subtasks

    /// Append a subtask to a task.
    pub fn add_subtask(&mut self, task: &TaskId, title: impl Into<String>) -> (Option<SubtaskId>, Changes) {
        let Some(task) = self.tasks.iter_mut().find(|t| &t.id == task) else {
            return (None, Changes::none());
        };
        let subtask = Subtask {
            id: SubtaskId::new(),
            title: title.into(),
            completed: false,
        };
        let id = subtask.id.clone();
        task.subtasks.push(subtask);
        let changes = Changes::touching(&[Bucket::Tasks]).with_group(task.group_id.clone());
        (Some(id), changes)
    }

    /// Apply a patch to a subtask, emitting a completion notice when it becomes done.
    pub fn update_subtask(&mut self, task: &TaskId, subtask: &SubtaskId, patch: SubtaskPatch) -> Changes {
        let Some(parent) = self.tasks.iter_mut().find(|t| &t.id == task) else {
            return Changes::none();
        };
        let Some(slot) = parent.subtasks.iter_mut().find(|s| &s.id == subtask) else {
            return Changes::none();
        };
        let newly_completed = patch.apply(slot);
        let group = parent.group_id.clone();
        let changes = Changes::touching(&[Bucket::Tasks]).with_group(group.clone());
        if newly_completed {
            changes.with_notice(Notice::SubtaskCompleted {
                task: task.clone(),
                subtask: subtask.clone(),
                group,
            })
        } else {
            changes
        }
    }

    /// Remove a subtask.
    pub fn delete_subtask(&mut self, task: &TaskId, subtask: &SubtaskId) -> Changes {
        let Some(parent) = self.tasks.iter_mut().find(|t| &t.id == task) else {
            return Changes::none();
        };
        let before = parent.subtasks.len();
        parent.subtasks.retain(|s| &s.id != subtask);
        if parent.subtasks.len() == before {
            return Changes::none();
        }
        Changes::touching(&[Bucket::Tasks]).with_group(parent.group_id.clone())
    }

    /// Reorder a subtask by list splice.
    ///
    /// The subtask's current position wins over `source_index` when they disagree.
    pub fn move_subtask(
        &mut self,
        task: &TaskId,
        subtask: &SubtaskId,
        source_index: usize,
        dest_index: usize,
    ) -> Changes {
        let Some(parent) = self.tasks.iter_mut().find(|t| &t.id == task) else {
            return Changes::none();
        };
        let from = parent
            .subtasks
            .iter()
            .position(|s| &s.id == subtask)
            .unwrap_or(source_index);
        if !ordering::splice_move(&mut parent.subtasks, from, dest_index) {
            return Changes::none();
        }
        Changes::touching(&[Bucket::Tasks]).with_group(parent.group_id.clone())
    }

    // Tags

    /// Create a tag.
    pub fn add_tag(&mut self, name: impl Into<String>, color: impl Into<String>) -> (TagId, Changes) {
        let tag = Tag {
            id: TagId::new(),
            name: name.into(),
            color: color.into(),
        };
        let id = tag.id.clone();
        self.tags.push(tag);
        (id, Changes::touching(&[Bucket::Tags]))
    }

    /// Rename or recolor a tag.
    pub fn update_tag(&mut self, id: &TagId, patch: TagPatch) -> Changes {
        let Some(tag) = self.tags.iter_mut().find(|tag| &tag.id == id) else {
            return Changes::none();
        };
        patch.apply(tag);
        Changes::touching(&[Bucket::Tags])
    }

    /// Delete a tag and strip it from every task.
    pub fn delete_tag(&mut self, id: &TagId) -> Changes {
        let before = self.tags.len();
        self.tags.retain(|tag| &tag.id != id);
        if self.tags.len() == before {
            return Changes::none();
        }
        let mut changes = Changes::touching(&[Bucket::Tags, Bucket::Tasks]);
        for task in &mut self.tasks {
            let count = task.tags.len();
            task.tags.retain(|tag| tag != id);
            if task.tags.len() != count {
                changes = changes.with_group(task.group_id.clone());
            }
        }
        changes
    }

    // Notes

    /// Create a note; a blank title falls back to [`DEFAULT_NOTE_TITLE`].
    pub fn add_note(&mut self, title: Option<String>, content: impl Into<String>) -> (NoteId, Changes) {
        let title = title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NOTE_TITLE.to_owned());
        let note = Note {
            id: NoteId::new(),
            title,
            content: content.into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let id = note.id.clone();
        self.notes.push(note);
        (id, Changes::touching(&[Bucket::Notes]))
    }

    /// Edit a note.
    pub fn update_note(&mut self, id: &NoteId, patch: NotePatch) -> Changes {
        let Some(note) = self.notes.iter_mut().find(|note| &note.id == id) else {
            return Changes::none();
        };
        patch.apply(note);
        Changes::touching(&[Bucket::Notes])
    }

    /// Delete a note.
    pub fn delete_note(&mut self, id: &NoteId) -> Changes {
        let before = self.notes.len();
        self.notes.retain(|note| &note.id != id);
        if self.notes.len() == before {
            return Changes::none();
        }
        Changes::touching(&[Bucket::Notes])
    }

    /// Turn a note into an active task of `group`, removing the note.
    pub fn convert_note_to_task(&mut self, id: &NoteId, group: Option<GroupId>) -> (Option<TaskId>, Changes) {
        let Some(index) = self.notes.iter().position(|note| &note.id == id) else {
            return (None, Changes::none());
        };
        let note = self.notes.remove(index);
        let title = if note.title.trim().is_empty() {
            DEFAULT_TASK_TITLE.to_owned()
        } else {
            note.title
        };
        let order = ordering::active_count(&self.tasks, group.as_ref());
        let mut task = Task::new(title, group.clone(), i64::try_from(order).unwrap_or(i64::MAX));
        if !note.content.is_empty() {
            task.description_entries
                .push(DescriptionEntry::new(note.content.clone(), task.created_at));
        }
        task.description = note.content;
        let task_id = task.id.clone();
        self.tasks.push(task);
        self.renumber();
        let changes = Changes::touching(&[Bucket::Notes, Bucket::Tasks]).with_group(group);
        (Some(task_id), changes)
    }

    // Archive

    /// Move every completed task into the archive.
    pub fn archive_completed_tasks(&mut self) -> Changes {
        let (completed, remaining): (Vec<Task>, Vec<Task>) =
            std::mem::take(&mut self.tasks).into_iter().partition(|task| task.completed);
        self.tasks = remaining;
        if completed.is_empty() {
            return Changes::none();
        }
        let mut changes = Changes::touching(&[Bucket::Tasks, Bucket::ArchivedTasks]);
        for task in &completed {
            changes = changes.with_group(task.group_id.clone());
        }
        self.archived_tasks.extend(completed);
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn assert_dense(state: &PlannerState) {
        let keys: BTreeSet<_> = state
            .tasks()
            .iter()
            .map(|task| (task.group_id.clone(), task.completed))
            .collect();
        for (group, completed) in keys {
            let orders: Vec<_> = state
                .tasks()
                .iter()
                .filter(|task| task.group_id == group && task.completed == completed)
                .map(|task| task.order)
                .collect();
            let expected: Vec<_> = (0..orders.len())
                .map(|i| i64::try_from(i).unwrap_or(i64::MAX))
                .collect();
            assert_eq!(orders, expected);
        }
    }

    fn completed_titles(state: &PlannerState, group: &GroupId) -> Vec<String> {
        state
            .group_tasks(Some(group))
            .into_iter()
            .filter(|task| task.completed)
            .map(|task| task.title.clone())
            .collect()
    }

    #[test]
    fn add_task_starts_active_at_partition_end() {
        let mut state = PlannerState::default();
        let (group, _) = state.add_group("g1");
        let (id, changes) = state.add_task(Some(group.clone()), "Buy milk");
        let task = state.task(&id).unwrap_or_else(|| panic!("task must exist"));
        assert_eq!(task.order, 0);
        assert!(!task.completed);
        assert!(task.subtasks.is_empty());
        assert!(task.tags.is_empty());
        assert!(changes.buckets.contains(&Bucket::Tasks));
        assert_eq!(
            changes.notices,
            vec![Notice::GroupTasksChanged { group: Some(group) }]
        );
    }

    #[test]
    fn complete_then_uncomplete_round_trip() {
        let mut state = PlannerState::default();
        let (group, _) = state.add_group("A");
        let (first, _) = state.add_task(Some(group.clone()), "first");
        let (second, _) = state.add_task(Some(group.clone()), "second");
        let (third, _) = state.add_task(Some(group.clone()), "third");

        state.complete_task(&first);
        let changes = state.complete_task(&second);
        assert!(changes.notices.contains(&Notice::TaskCompleted {
            task: second.clone(),
            group: Some(group.clone()),
        }));
        assert_eq!(completed_titles(&state, &group), vec!["first", "second"]);
        assert_dense(&state);

        state.uncomplete_task(&first);
        let active = state.task(&first).unwrap_or_else(|| panic!("task must exist"));
        assert!(!active.completed);
        assert!(active.completed_at.is_none());
        assert_eq!(active.order, 1);
        assert_eq!(state.task(&third).map(|t| t.order), Some(0));

        state.complete_task(&first);
        assert_eq!(completed_titles(&state, &group), vec!["second", "first"]);
        assert_dense(&state);
    }

    #[test]
    fn completing_twice_is_noop() {
        let mut state = PlannerState::default();
        let (id, _) = state.add_task(None, "once");
        assert!(!state.complete_task(&id).is_empty());
        assert!(state.complete_task(&id).is_empty());
        assert!(state.uncomplete_task(&TaskId::new()).is_empty());
    }

    #[test]
    fn update_task_with_completion_flip_repartitions() {
        let mut state = PlannerState::default();
        let (group, _) = state.add_group("A");
        let (a, _) = state.add_task(Some(group.clone()), "a");
        let (b, _) = state.add_task(Some(group.clone()), "b");
        state.update_task(
            &a,
            TaskPatch {
                completed: Some(true),
                ..TaskPatch::default()
            },
        );
        let done = state.task(&a).unwrap_or_else(|| panic!("task must exist"));
        assert!(done.completed_at.is_some());
        assert_eq!(done.order, 0);
        assert_eq!(state.task(&b).map(|t| t.order), Some(0));
        assert_dense(&state);
    }

    #[test]
    fn update_task_group_change_notifies_both_groups() {
        let mut state = PlannerState::default();
        let (a, _) = state.add_group("A");
        let (b, _) = state.add_group("B");
        let (task, _) = state.add_task(Some(a.clone()), "wander");
        let changes = state.update_task(
            &task,
            TaskPatch {
                group_id: Some(Some(b.clone())),
                ..TaskPatch::default()
            },
        );
        assert_eq!(changes.notices.len(), 2);
        assert!(state.group_tasks(Some(&a)).is_empty());
        assert_eq!(state.group_tasks(Some(&b)).len(), 1);
        assert_dense(&state);
    }

    #[test]
    fn delete_task_renumbers() {
        let mut state = PlannerState::default();
        let (first, _) = state.add_task(None, "1");
        let (second, _) = state.add_task(None, "2");
        state.delete_task(&first);
        assert_eq!(state.task(&second).map(|t| t.order), Some(0));
        assert!(state.delete_task(&first).is_empty());
    }

    #[test]
    fn delete_group_detaches_tasks() {
        let mut state = PlannerState::default();
        let (group, _) = state.add_group("doomed");
        let (task, _) = state.add_task(Some(group.clone()), "survivor");
        let changes = state.delete_group(&group);
        assert!(state.groups().is_empty());
        let survivor = state.task(&task).unwrap_or_else(|| panic!("task must survive"));
        assert!(survivor.group_id.is_none());
        assert!(changes.buckets.contains(&Bucket::Tasks));
        assert_dense(&state);
    }

    #[test]
    fn move_group_splices() {
        let mut state = PlannerState::default();
        state.add_group("a");
        state.add_group("b");
        state.add_group("c");
        state.move_group(2, 0);
        let names: Vec<_> = state.groups().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert!(state.move_group(5, 0).is_empty());
    }

    #[test]
    fn move_task_scenario() {
        let mut state = PlannerState::default();
        let (a, _) = state.add_group("A");
        let (t1, _) = state.add_task(Some(a.clone()), "T1");
        let (t2, _) = state.add_task(Some(a.clone()), "T2");
        let (t3, _) = state.add_task(Some(a.clone()), "T3");
        state.complete_task(&t3);

        let changes = state.move_task(&TaskMove {
            task: t2.clone(),
            source_group: Some(a.clone()),
            dest_group: Some(a.clone()),
            source_index: 1,
            dest_index: 0,
        });
        assert_eq!(changes.notices.len(), 1);
        assert_eq!(state.task(&t2).map(|t| t.order), Some(0));
        assert_eq!(state.task(&t1).map(|t| t.order), Some(1));
        let done = state.task(&t3).unwrap_or_else(|| panic!("task must exist"));
        assert!(done.completed);
        assert_eq!(done.order, 0);
    }

    #[test]
    fn description_entries_are_newest_first() {
        let mut state = PlannerState::default();
        let (task, _) = state.add_task(None, "journal");
        state.add_description_entry(&task, "older");
        let (newest, _) = state.add_description_entry(&task, "newer");
        let newest = newest.unwrap_or_else(|| panic!("entry must exist"));
        state.edit_description_entry(&task, &newest, "newest, edited");
        let entries = &state.task(&task).unwrap_or_else(|| panic!("task")).description_entries;
        assert_eq!(entries[0].text, "newest, edited");
        assert!(entries[0].edited_at.is_some());
        assert_eq!(entries[1].text, "older");
        assert!(entries[1].edited_at.is_none());
    }

    #[test]
    fn subtask_lifecycle() {
        let mut state = PlannerState::default();
        let (task, _) = state.add_task(None, "parent");
        let (one, _) = state.add_subtask(&task, "one");
        let (two, _) = state.add_subtask(&task, "two");
        let one = one.unwrap_or_else(|| panic!("subtask"));
        let two = two.unwrap_or_else(|| panic!("subtask"));

        let changes = state.update_subtask(
            &task,
            &one,
            SubtaskPatch {
                completed: Some(true),
                ..SubtaskPatch::default()
            },
        );
        assert!(
            changes
                .notices
                .iter()
                .any(|notice| matches!(notice, Notice::SubtaskCompleted { .. }))
        );

        state.move_subtask(&task, &two, 1, 0);
        let titles: Vec<_> = state
            .task(&task)
            .unwrap_or_else(|| panic!("task"))
            .subtasks
            .iter()
            .map(|s| s.title.clone())
            .collect();
        assert_eq!(titles, vec!["two", "one"]);

        state.delete_subtask(&task, &one);
        assert_eq!(state.task(&task).map(|t| t.subtasks.len()), Some(1));
        assert!(state.delete_subtask(&task, &one).is_empty());
    }

    #[test]
    fn delete_tag_strips_task_references() {
        let mut state = PlannerState::default();
        let (tag, _) = state.add_tag("urgent", "#ef4444");
        let (task, _) = state.add_task(None, "tagged");
        state.update_task(
            &task,
            TaskPatch {
                tags: Some(vec![tag.clone()]),
                ..TaskPatch::default()
            },
        );
        let changes = state.delete_tag(&tag);
        assert!(changes.buckets.contains(&Bucket::Tasks));
        assert!(state.tags().is_empty());
        assert!(state.task(&task).is_some_and(|t| t.tags.is_empty()));
    }

    #[test]
    fn notes_default_and_keep_title() {
        let mut state = PlannerState::default();
        let (note, _) = state.add_note(None, "");
        assert_eq!(state.note(&note).map(|n| n.title.as_str()), Some(DEFAULT_NOTE_TITLE));
        state.update_note(
            &note,
            NotePatch {
                title: Some(String::new()),
                content: Some("body".into()),
            },
        );
        let stored = state.note(&note).unwrap_or_else(|| panic!("note"));
        assert_eq!(stored.title, DEFAULT_NOTE_TITLE);
        assert_eq!(stored.content, "body");
        state.delete_note(&note);
        assert!(state.notes().is_empty());
    }

    #[test]
    fn convert_note_to_task_scenario() {
        let mut state = PlannerState::default();
        let (group, _) = state.add_group("g1");
        let (note, _) = state.add_note(Some("Plan trip".into()), "Book flights");
        let (task, changes) = state.convert_note_to_task(&note, Some(group.clone()));
        let task = task.unwrap_or_else(|| panic!("task must be created"));
        assert!(state.notes().is_empty());
        assert_eq!(state.tasks().len(), 1);
        let created = state.task(&task).unwrap_or_else(|| panic!("task"));
        assert_eq!(created.title, "Plan trip");
        assert_eq!(created.description_entries[0].text, "Book flights");
        assert_eq!(created.group_id.as_ref(), Some(&group));
        assert!(changes.buckets.contains(&Bucket::Notes));

        let (missing, changes) = state.convert_note_to_task(&note, None);
        assert!(missing.is_none());
        assert!(changes.is_empty());
    }

    #[test]
    fn convert_empty_note_has_no_entries() {
        let mut state = PlannerState::default();
        let (note, _) = state.add_note(Some("Idea".into()), "");
        let (task, _) = state.convert_note_to_task(&note, None);
        let task = task.unwrap_or_else(|| panic!("task"));
        assert!(state.task(&task).is_some_and(|t| t.description_entries.is_empty()));
    }

    #[test]
    fn archive_moves_completed_tasks() {
        let mut state = PlannerState::default();
        let (group, _) = state.add_group("A");
        let (done, _) = state.add_task(Some(group.clone()), "done");
        let (open, _) = state.add_task(Some(group.clone()), "open");
        state.complete_task(&done);
        let changes = state.archive_completed_tasks();
        assert!(changes.buckets.contains(&Bucket::ArchivedTasks));
        assert_eq!(state.archived_tasks().len(), 1);
        assert!(state.task(&done).is_none());
        assert!(state.task(&open).is_some());
        assert!(state.archive_completed_tasks().is_empty());
    }

    #[test]
    fn missing_ids_are_noops() {
        let mut state = PlannerState::default();
        let ghost = TaskId::new();
        assert!(state.update_task(&ghost, TaskPatch::default()).is_empty());
        assert!(state.delete_task(&ghost).is_empty());
        assert!(state.update_group(&GroupId::new(), GroupPatch::default()).is_empty());
        assert!(state.delete_group(&GroupId::new()).is_empty());
        assert!(state.delete_tag(&TagId::new()).is_empty());
        assert!(state.add_subtask(&ghost, "x").0.is_none());
        assert!(state.edit_description_entry(&ghost, &EntryId::new(), "x").is_empty());
    }

    #[test]
    fn search_covers_tags_and_subtasks() {
        let mut state = PlannerState::default();
        let (tag, _) = state.add_tag("Errands", "#22c55e");
        let (task, _) = state.add_task(None, "Shopping");
        state.add_subtask(&task, "Pick up parcel");
        state.update_task(
            &task,
            TaskPatch {
                tags: Some(vec![tag]),
                ..TaskPatch::default()
            },
        );
        state.add_task(None, "Unrelated");
        assert_eq!(state.search("parcel").len(), 1);
        assert_eq!(state.search("errands").len(), 1);
        assert_eq!(state.search("  ").len(), 2);
    }
}
