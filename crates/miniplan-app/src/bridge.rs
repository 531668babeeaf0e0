//! Notification bridge towards the stream overlay.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use miniplan_core::id::{GroupId, SubtaskId, TaskId};
use miniplan_hooks::{HookContext, HookExecutor, HooksConfig, StreamTask};
use serde::Serialize;
use tracing::debug;

/// Which group, if any, is mirrored to the overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSettings {
    /// Whether mirroring is on.
    pub enabled: bool,
    /// The streamed group.
    pub stream_group: Option<GroupId>,
}

impl StreamSettings {
    /// Whether changes to `group` must be published.
    #[must_use]
    pub fn streams(&self, group: Option<&GroupId>) -> bool {
        self.enabled && group.is_some() && self.stream_group.as_ref() == group
    }
}

/// Sink for stream notifications. Calls are best-effort and may block.
pub trait NotificationBridge: Send + Sync + 'static {
    /// Current stream settings.
    fn stream_settings(&self) -> StreamSettings;

    /// Publish the full task list of the streamed group.
    ///
    /// # Errors
    /// Returns an error when the overlay could not be updated.
    fn push_group_tasks(&self, tasks: &[StreamTask]) -> Result<()>;

    /// Announce that a task was completed.
    ///
    /// # Errors
    /// Returns an error when the overlay could not be notified.
    fn notify_task_completed(&self, task: &TaskId, group: Option<&GroupId>) -> Result<()>;

    /// Announce that a subtask was completed.
    ///
    /// # Errors
    /// Returns an error when the overlay could not be notified.
    fn notify_subtask_completed(&self, task: &TaskId, subtask: &SubtaskId, group: Option<&GroupId>) -> Result<()>;
}

/// Bridge that runs the configured hook scripts.
#[derive(Debug, Clone)]
pub struct HookBridge {
    settings: StreamSettings,
    executor: HookExecutor,
}

impl HookBridge {
    /// Build a bridge running hooks from `base_dir`.
    #[must_use]
    pub const fn new(settings: StreamSettings, hooks: HooksConfig, base_dir: PathBuf) -> Self {
        Self {
            settings,
            executor: HookExecutor::new(hooks, base_dir),
        }
    }

    fn run(&self, context: &HookContext) -> Result<()> {
        let hook = context.kind().script_name();
        match self.executor.execute(context)? {
            Some(result) => debug!(hook, stdout = %result.stdout.trim(), "Hook finished"),
            None => debug!(hook, "No hook installed"),
        }
        Ok(())
    }
}

impl NotificationBridge for HookBridge {
    fn stream_settings(&self) -> StreamSettings {
        self.settings.clone()
    }

    fn push_group_tasks(&self, tasks: &[StreamTask]) -> Result<()> {
        self.run(&HookContext::PushGroupTasks {
            group_id: self.settings.stream_group.clone(),
            tasks: tasks.to_vec(),
        })
    }

    fn notify_task_completed(&self, task: &TaskId, group: Option<&GroupId>) -> Result<()> {
        self.run(&HookContext::TaskCompleted {
            task_id: task.clone(),
            group_id: group.cloned(),
        })
    }

    fn notify_subtask_completed(&self, task: &TaskId, subtask: &SubtaskId, group: Option<&GroupId>) -> Result<()> {
        self.run(&HookContext::SubtaskCompleted {
            task_id: task.clone(),
            subtask_id: subtask.clone(),
            group_id: group.cloned(),
        })
    }
}

/// Bridge that never streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBridge;

impl NotificationBridge for NoopBridge {
    fn stream_settings(&self) -> StreamSettings {
        StreamSettings::default()
    }

    fn push_group_tasks(&self, _tasks: &[StreamTask]) -> Result<()> {
        Ok(())
    }

    fn notify_task_completed(&self, _task: &TaskId, _group: Option<&GroupId>) -> Result<()> {
        Ok(())
    }

    fn notify_subtask_completed(&self, _task: &TaskId, _subtask: &SubtaskId, _group: Option<&GroupId>) -> Result<()> {
        Ok(())
    }
}

/// Call observed by a [`RecordingBridge`].
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeCall {
    /// `push_group_tasks` with the pushed tasks.
    PushGroupTasks(Vec<StreamTask>),
    /// `notify_task_completed`.
    TaskCompleted(TaskId, Option<GroupId>),
    /// `notify_subtask_completed`.
    SubtaskCompleted(TaskId, SubtaskId, Option<GroupId>),
}

/// Bridge that records every call, for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    settings: StreamSettings,
    calls: Mutex<Vec<BridgeCall>>,
}

impl RecordingBridge {
    /// Create a recorder reporting `settings`.
    #[must_use]
    pub fn new(settings: StreamSettings) -> Self {
        Self {
            settings,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<BridgeCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: BridgeCall) -> Result<()> {
        self.calls
            .lock()
            .map_err(|_| anyhow!("recording bridge lock poisoned"))?
            .push(call);
        Ok(())
    }
}

impl NotificationBridge for RecordingBridge {
    fn stream_settings(&self) -> StreamSettings {
        self.settings.clone()
    }

    fn push_group_tasks(&self, tasks: &[StreamTask]) -> Result<()> {
        self.record(BridgeCall::PushGroupTasks(tasks.to_vec()))
    }

    fn notify_task_completed(&self, task: &TaskId, group: Option<&GroupId>) -> Result<()> {
        self.record(BridgeCall::TaskCompleted(task.clone(), group.cloned()))
    }

    fn notify_subtask_completed(&self, task: &TaskId, subtask: &SubtaskId, group: Option<&GroupId>) -> Result<()> {
        self.record(BridgeCall::SubtaskCompleted(task.clone(), subtask.clone(), group.cloned()))
    }
}
