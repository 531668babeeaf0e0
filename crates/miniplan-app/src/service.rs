//! Service façade over the planner and music state.

use std::sync::Arc;

use anyhow::{Context, Result};
use miniplan_core::id::GroupId;
use miniplan_core::migrate::{self, StoredTask};
use miniplan_core::model::Task;
use miniplan_core::{Bucket, Changes, DailyStats, FocusState, MusicState, Notice, Outcome, PlannerState};
use miniplan_hooks::StreamTask;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::bridge::{NotificationBridge, StreamSettings};
use crate::config::MusicConfig;
use crate::filter::TaskFilter;
use crate::store::KeyValueStore;
use crate::worker::{Effect, EffectQueue};

/// Display name used for ungrouped tasks on the overlay.
pub const UNGROUPED_NAME: &str = "Tasks";

/// Service façade owning the planner and music state.
///
/// Every mutation runs synchronously against the in-memory state; the
/// resulting persistence and notification effects are handed to a background
/// queue and never awaited by the caller.
#[derive(Debug)]
pub struct PlannerService {
    planner: PlannerState,
    music: MusicState,
    focus: FocusState,
    settings: StreamSettings,
    queue: EffectQueue,
    rng: StdRng,
}

impl PlannerService {
    /// Load every bucket from `store` and start the effect worker.
    ///
    /// Legacy tasks are upgraded and written back. When streaming is enabled,
    /// the stream group's task list is pushed once.
    ///
    /// # Errors
    /// Returns an error when a bucket cannot be read or holds malformed data.
    pub async fn load<S, B>(store: Arc<S>, bridge: Arc<B>, music: &MusicConfig) -> Result<Self>
    where
        S: KeyValueStore,
        B: NotificationBridge,
    {
        let groups = read_bucket(&store, Bucket::Groups).await?;
        let stored: Vec<StoredTask> = read_bucket(&store, Bucket::Tasks).await?;
        let tags = read_bucket(&store, Bucket::Tags).await?;
        let notes = read_bucket(&store, Bucket::Notes).await?;
        let archived: Vec<StoredTask> = read_bucket(&store, Bucket::ArchivedTasks).await?;
        let moods = read_bucket(&store, Bucket::Moods).await?;
        let songs = read_bucket(&store, Bucket::Songs).await?;

        let (tasks, upgraded) = migrate::migrate_tasks(stored);
        let (archived, archived_upgraded) = migrate::migrate_tasks(archived);

        let planner = PlannerState::from_parts(groups, tasks, tags, notes, archived);
        let mut music_state = MusicState::from_parts(moods, songs);
        music_state.restore_preferences(music.volume, music.shuffle, music.repeat);

        let settings = bridge.stream_settings();
        let queue = EffectQueue::spawn(store, bridge);
        let service = Self {
            planner,
            music: music_state,
            focus: FocusState::default(),
            settings,
            queue,
            rng: StdRng::from_entropy(),
        };

        let mut startup = Changes::none();
        if upgraded > 0 {
            info!(count = upgraded, "Upgraded legacy task descriptions");
            startup.buckets.insert(Bucket::Tasks);
        }
        if archived_upgraded > 0 {
            info!(count = archived_upgraded, "Upgraded legacy archived task descriptions");
            startup.buckets.insert(Bucket::ArchivedTasks);
        }
        if service.settings.enabled {
            startup = startup.with_group(service.settings.stream_group.clone());
        }
        service.dispatch(startup);

        Ok(service)
    }

    /// Planner collections.
    #[must_use]
    pub const fn planner(&self) -> &PlannerState {
        &self.planner
    }

    /// Music library and playback state.
    #[must_use]
    pub const fn music(&self) -> &MusicState {
        &self.music
    }

    /// Current focus session.
    #[must_use]
    pub const fn focus(&self) -> &FocusState {
        &self.focus
    }

    /// Stream settings reported by the bridge at load time.
    #[must_use]
    pub const fn stream_settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Run a planner reducer and schedule its effects.
    pub fn with_planner<O, F>(&mut self, op: F) -> O::Value
    where
        O: Outcome,
        F: FnOnce(&mut PlannerState) -> O,
    {
        let (value, changes) = op(&mut self.planner).split();
        self.dispatch(changes);
        value
    }

    /// Run a music reducer and schedule its effects.
    pub fn with_music<O, F>(&mut self, op: F) -> O::Value
    where
        O: Outcome,
        F: FnOnce(&mut MusicState, &mut StdRng) -> O,
    {
        let (value, changes) = op(&mut self.music, &mut self.rng).split();
        self.dispatch(changes);
        value
    }

    /// Drive the focus session. Sessions are never persisted.
    pub fn with_focus<T, F>(&mut self, op: F) -> T
    where
        F: FnOnce(&mut FocusState, &PlannerState) -> T,
    {
        op(&mut self.focus, &self.planner)
    }

    /// Tasks matching `filter`, in display order.
    #[must_use]
    pub fn filter_tasks(&self, filter: &TaskFilter) -> Vec<&Task> {
        filter.apply(&self.planner)
    }

    /// Counters for the planner day containing `now`.
    #[must_use]
    pub fn stats(&self, now: OffsetDateTime) -> DailyStats {
        DailyStats::compute(&self.planner, now)
    }

    /// Tasks of `group` as published to the overlay.
    #[must_use]
    pub fn stream_tasks(&self, group: Option<&GroupId>) -> Vec<StreamTask> {
        let group_name = group
            .and_then(|id| self.planner.group(id))
            .map_or(UNGROUPED_NAME, |group| group.name.as_str());
        self.planner
            .group_tasks(group)
            .into_iter()
            .map(|task| StreamTask {
                task: task.clone(),
                group_name: group_name.to_owned(),
            })
            .collect()
    }

    /// Wait until every scheduled effect has been applied.
    pub async fn flush(&self) {
        self.queue.flush().await;
    }

    /// Drain the effect queue and stop the worker.
    ///
    /// # Errors
    /// Returns an error when the worker terminated abnormally.
    pub async fn shutdown(self) -> Result<()> {
        self.queue.shutdown().await
    }

    fn dispatch(&self, changes: Changes) {
        let Changes { buckets, notices } = changes;
        for bucket in buckets {
            match self.snapshot(bucket) {
                Ok(value) => self.queue.send(Effect::Persist { bucket, value }),
                Err(err) => warn!(bucket = bucket.key(), error = %err, "Failed to serialize bucket"),
            }
        }

        for notice in notices {
            if !self.settings.streams(notice.group()) {
                continue;
            }
            let effect = match notice {
                Notice::GroupTasksChanged { group } => Effect::PushGroupTasks {
                    tasks: self.stream_tasks(group.as_ref()),
                },
                Notice::TaskCompleted { task, group } => Effect::TaskCompleted { task, group },
                Notice::SubtaskCompleted { task, subtask, group } => {
                    Effect::SubtaskCompleted { task, subtask, group }
                }
            };
            self.queue.send(effect);
        }
    }

    fn snapshot(&self, bucket: Bucket) -> serde_json::Result<Value> {
        match bucket {
            Bucket::Groups => serde_json::to_value(self.planner.groups()),
            Bucket::Tasks => serde_json::to_value(self.planner.tasks()),
            Bucket::Tags => serde_json::to_value(self.planner.tags()),
            Bucket::Notes => serde_json::to_value(self.planner.notes()),
            Bucket::ArchivedTasks => serde_json::to_value(self.planner.archived_tasks()),
            Bucket::Moods => serde_json::to_value(self.music.moods()),
            Bucket::Songs => serde_json::to_value(self.music.songs()),
        }
    }
}

async fn read_bucket<S, T>(store: &Arc<S>, bucket: Bucket) -> Result<Vec<T>>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    let reader = Arc::clone(store);
    let value = tokio::task::spawn_blocking(move || reader.get(bucket.key()).map_err(Into::<anyhow::Error>::into))
        .await
        .context("bucket read task failed")?
        .with_context(|| format!("failed to read bucket {}", bucket.key()))?;
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value)
            .with_context(|| format!("bucket {} holds malformed data", bucket.key())),
    }
}
