//! Background queue applying persistence and notification effects.

use std::sync::Arc;

use anyhow::{Context, Result};
use miniplan_core::Bucket;
use miniplan_core::id::{GroupId, SubtaskId, TaskId};
use miniplan_hooks::StreamTask;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bridge::NotificationBridge;
use crate::store::KeyValueStore;

/// Side effect scheduled after a state transition.
#[derive(Debug)]
pub enum Effect {
    /// Replace a bucket snapshot.
    Persist {
        /// Target bucket.
        bucket: Bucket,
        /// Full collection snapshot.
        value: Value,
    },
    /// Publish the streamed group's task list.
    PushGroupTasks {
        /// Tasks in display order.
        tasks: Vec<StreamTask>,
    },
    /// Announce a completed task.
    TaskCompleted {
        /// Completed task.
        task: TaskId,
        /// Its group.
        group: Option<GroupId>,
    },
    /// Announce a completed subtask.
    SubtaskCompleted {
        /// Parent task.
        task: TaskId,
        /// Completed subtask.
        subtask: SubtaskId,
        /// Group of the parent task.
        group: Option<GroupId>,
    },
}

impl Effect {
    const fn label(&self) -> &'static str {
        match self {
            Self::Persist { .. } => "persist",
            Self::PushGroupTasks { .. } => "push-group-tasks",
            Self::TaskCompleted { .. } => "task-completed",
            Self::SubtaskCompleted { .. } => "subtask-completed",
        }
    }
}

#[derive(Debug)]
enum Message {
    Apply(Effect),
    Flush(oneshot::Sender<()>),
}

/// Handle to the effect worker.
#[derive(Debug)]
pub struct EffectQueue {
    sender: mpsc::UnboundedSender<Message>,
    handle: JoinHandle<()>,
}

impl EffectQueue {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// Effects are applied one at a time in the order they were sent.
    #[must_use]
    pub fn spawn<S, B>(store: Arc<S>, bridge: Arc<B>) -> Self
    where
        S: KeyValueStore,
        B: NotificationBridge,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(receiver, store, bridge));
        Self { sender, handle }
    }

    /// Schedule an effect; failures are logged by the worker.
    pub fn send(&self, effect: Effect) {
        if let Err(err) = self.sender.send(Message::Apply(effect)) {
            warn!(effect = err.0.label(), "Effect queue closed; dropping effect");
        }
    }

    /// Wait until every effect sent so far has been applied.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(Message::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// Close the queue and wait for the worker to drain it.
    ///
    /// # Errors
    /// Returns an error when the worker task panicked.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.sender);
        self.handle.await.context("effect worker terminated abnormally")
    }
}

impl Message {
    const fn label(&self) -> &'static str {
        match self {
            Self::Apply(effect) => effect.label(),
            Self::Flush(_) => "flush",
        }
    }
}

async fn run<S, B>(mut receiver: mpsc::UnboundedReceiver<Message>, store: Arc<S>, bridge: Arc<B>)
where
    S: KeyValueStore,
    B: NotificationBridge,
{
    while let Some(message) = receiver.recv().await {
        let effect = match message {
            Message::Apply(effect) => effect,
            Message::Flush(done) => {
                let _ = done.send(());
                continue;
            }
        };
        let label = effect.label();
        let store = Arc::clone(&store);
        let bridge = Arc::clone(&bridge);
        match tokio::task::spawn_blocking(move || apply(store.as_ref(), bridge.as_ref(), effect)).await {
            Ok(Ok(())) => debug!(effect = label, "Effect applied"),
            Ok(Err(err)) => warn!(effect = label, error = %format!("{err:#}"), "Effect failed"),
            Err(err) => warn!(effect = label, error = %err, "Effect task aborted"),
        }
    }
    debug!("Effect queue drained");
}

fn apply<S, B>(store: &S, bridge: &B, effect: Effect) -> Result<()>
where
    S: KeyValueStore,
    B: NotificationBridge,
{
    match effect {
        Effect::Persist { bucket, value } => store
            .set(bucket.key(), &value)
            .map_err(Into::<anyhow::Error>::into)
            .with_context(|| format!("failed to persist {}", bucket.key())),
        Effect::PushGroupTasks { tasks } => bridge.push_group_tasks(&tasks),
        Effect::TaskCompleted { task, group } => bridge.notify_task_completed(&task, group.as_ref()),
        Effect::SubtaskCompleted { task, subtask, group } => {
            bridge.notify_subtask_completed(&task, &subtask, group.as_ref())
        }
    }
}
