use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::id::{GroupId, SubtaskId, TaskId};

/// Named collection in the persistence store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Bucket {
    /// Task groups.
    Groups,
    /// Live tasks.
    Tasks,
    /// Tags.
    Tags,
    /// Notes.
    Notes,
    /// Archived (completed and cleared) tasks.
    ArchivedTasks,
    /// Music moods.
    Moods,
    /// Music library.
    Songs,
}

impl Bucket {
    /// Every bucket, in load order.
    pub const ALL: [Self; 7] = [
        Self::Groups,
        Self::Tasks,
        Self::Tags,
        Self::Notes,
        Self::ArchivedTasks,
        Self::Moods,
        Self::Songs,
    ];

    /// Key under which the bucket is stored.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Groups => "groups",
            Self::Tasks => "tasks",
            Self::Tags => "tags",
            Self::Notes => "notes",
            Self::ArchivedTasks => "archivedTasks",
            Self::Moods => "music_moods",
            Self::Songs => "music_songs",
        }
    }
}

/// Notification intent produced by a planner operation.
///
/// Whether an intent reaches the bridge depends on the stream settings, which
/// the core does not know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The task list of a group changed.
    GroupTasksChanged {
        /// Affected group (`None` for ungrouped tasks).
        group: Option<GroupId>,
    },
    /// A task transitioned to completed.
    TaskCompleted {
        /// Completed task.
        task: TaskId,
        /// Group of the task.
        group: Option<GroupId>,
    },
    /// A subtask was marked completed.
    SubtaskCompleted {
        /// Parent task.
        task: TaskId,
        /// Completed subtask.
        subtask: SubtaskId,
        /// Group of the parent task.
        group: Option<GroupId>,
    },
}

impl Notice {
    /// Group the notice refers to.
    #[must_use]
    pub const fn group(&self) -> Option<&GroupId> {
        match self {
            Self::GroupTasksChanged { group }
            | Self::TaskCompleted { group, .. }
            | Self::SubtaskCompleted { group, .. } => group.as_ref(),
        }
    }
}

/// Side effects requested by a state transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    /// Buckets whose snapshot must be written.
    pub buckets: BTreeSet<Bucket>,
    /// Notification intents in emission order.
    pub notices: Vec<Notice>,
}

impl Changes {
    /// Empty change set (used for no-op operations).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Change set touching the given buckets.
    #[must_use]
    pub fn touching(buckets: &[Bucket]) -> Self {
        Self {
            buckets: buckets.iter().copied().collect(),
            notices: Vec::new(),
        }
    }

    /// Append a notification intent.
    #[must_use]
    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }

    /// Record that a group's task list changed, skipping duplicates.
    #[must_use]
    pub fn with_group(mut self, group: Option<GroupId>) -> Self {
        let notice = Notice::GroupTasksChanged { group };
        if !self.notices.contains(&notice) {
            self.notices.push(notice);
        }
        self
    }

    /// Returns true when nothing needs to be persisted or notified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty() && self.notices.is_empty()
    }

    /// Fold another change set into this one.
    pub fn merge(&mut self, other: Self) {
        self.buckets.extend(other.buckets);
        for notice in other.notices {
            if !self.notices.contains(&notice) {
                self.notices.push(notice);
            }
        }
    }
}

/// Return value of a reducer: a change set, optionally paired with a value.
pub trait Outcome {
    /// Value handed back to the caller once effects are dispatched.
    type Value;

    /// Separate the caller's value from the change set.
    fn split(self) -> (Self::Value, Changes);
}

impl Outcome for Changes {
    type Value = ();

    fn split(self) -> ((), Changes) {
        ((), self)
    }
}

impl<T> Outcome for (T, Changes) {
    type Value = T;

    fn split(self) -> (T, Changes) {
        self
    }
}

impl Outcome for () {
    type Value = ();

    fn split(self) -> ((), Changes) {
        ((), Changes::none())
    }
}
