//! Hook types and context

use miniplan_core::id::{GroupId, SubtaskId, TaskId};
use miniplan_core::model::Task;
use serde::{Deserialize, Serialize};

/// Hook types that can be executed
///
/// Every hook is a notification: it runs after the in-memory state has
/// changed and its outcome never affects that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookKind {
    /// The streamed group's task list changed
    ///
    /// Receives the full task list of the group, each task carrying the
    /// group's display name.
    PushGroupTasks,

    /// A task in the streamed group was completed
    TaskCompleted,

    /// A subtask of a task in the streamed group was completed
    SubtaskCompleted,
}

impl HookKind {
    /// Every hook kind.
    pub const ALL: [Self; 3] = [Self::PushGroupTasks, Self::TaskCompleted, Self::SubtaskCompleted];

    /// Returns the script name for this hook kind
    #[must_use]
    pub const fn script_name(self) -> &'static str {
        match self {
            Self::PushGroupTasks => "push-group-tasks",
            Self::TaskCompleted => "task-completed",
            Self::SubtaskCompleted => "subtask-completed",
        }
    }
}

/// Task as published to the stream overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamTask {
    /// The task itself, flattened into the document.
    #[serde(flatten)]
    pub task: Task,
    /// Display name of the task's group.
    pub group_name: String,
}

/// Context passed to hook scripts on stdin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum HookContext {
    /// Full task list of the streamed group.
    PushGroupTasks {
        /// Streamed group.
        group_id: Option<GroupId>,
        /// Tasks of the group, active first.
        tasks: Vec<StreamTask>,
    },
    /// A task was completed.
    TaskCompleted {
        /// Completed task.
        task_id: TaskId,
        /// Group of the task.
        group_id: Option<GroupId>,
    },
    /// A subtask was completed.
    SubtaskCompleted {
        /// Parent task.
        task_id: TaskId,
        /// Completed subtask.
        subtask_id: SubtaskId,
        /// Group of the parent task.
        group_id: Option<GroupId>,
    },
}

impl HookContext {
    /// Hook that handles this context
    #[must_use]
    pub const fn kind(&self) -> HookKind {
        match self {
            Self::PushGroupTasks { .. } => HookKind::PushGroupTasks,
            Self::TaskCompleted { .. } => HookKind::TaskCompleted,
            Self::SubtaskCompleted { .. } => HookKind::SubtaskCompleted,
        }
    }
}

/// Result from hook execution
#[derive(Debug, Clone)]
pub struct HookResult {
    /// Exit code from the hook script
    pub exit_code: i32,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl HookResult {
    /// Returns true if the hook execution was successful
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}
