//! Focus sessions.
//!
//! A session pins one task or note (or nothing, for free-form writing) and
//! runs a countdown. Like playback, it lives in memory only.

use serde::Serialize;

use crate::id::{NoteId, TaskId};
use crate::patch::FocusTimerPatch;
use crate::planner::PlannerState;

/// Length of a fresh session, in seconds.
pub const DEFAULT_FOCUS_SECS: u64 = 20 * 60;
/// Time added by [`FocusState::extend`], in seconds.
pub const EXTENSION_SECS: u64 = 5 * 60;

/// What a focus session is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum FocusTarget {
    /// A task.
    Task(TaskId),
    /// A note.
    Note(NoteId),
}

/// Countdown of a focus session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusTimer {
    /// Total length in seconds, including extensions.
    pub duration: u64,
    /// Seconds remaining.
    pub time_left: u64,
    /// Whether the countdown is running.
    pub is_running: bool,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self {
            duration: DEFAULT_FOCUS_SECS,
            time_left: DEFAULT_FOCUS_SECS,
            is_running: false,
        }
    }
}

/// Focus session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusState {
    active: bool,
    minimized: bool,
    target: Option<FocusTarget>,
    timer: FocusTimer,
}

impl FocusState {
    /// Whether a session is open.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the open session is minimized.
    #[must_use]
    pub const fn is_minimized(&self) -> bool {
        self.minimized
    }

    /// Task or note of the session; `None` for free-form sessions.
    #[must_use]
    pub const fn target(&self) -> Option<&FocusTarget> {
        self.target.as_ref()
    }

    /// Countdown of the session.
    #[must_use]
    pub const fn timer(&self) -> &FocusTimer {
        &self.timer
    }

    /// Open a session with a fresh timer.
    ///
    /// A task or note target starts the countdown right away; a free-form
    /// session waits for [`FocusState::restore`]. Unknown targets leave the
    /// state untouched and return `false`.
    pub fn start(&mut self, target: Option<FocusTarget>, planner: &PlannerState) -> bool {
        let known = match &target {
            None => true,
            Some(FocusTarget::Task(id)) => planner.task(id).is_some(),
            Some(FocusTarget::Note(id)) => planner.note(id).is_some(),
        };
        if !known {
            return false;
        }
        self.active = true;
        self.minimized = false;
        self.timer = FocusTimer {
            is_running: target.is_some(),
            ..FocusTimer::default()
        };
        self.target = target;
        true
    }

    /// Close the session; the timer keeps its counts but stops.
    pub fn stop(&mut self) {
        self.active = false;
        self.minimized = false;
        self.target = None;
        self.timer.is_running = false;
    }

    /// Minimize the session and pause the countdown.
    pub const fn minimize(&mut self) {
        if self.active {
            self.minimized = true;
            self.timer.is_running = false;
        }
    }

    /// Bring the session back and resume the countdown.
    pub const fn restore(&mut self) {
        if self.active {
            self.minimized = false;
            self.timer.is_running = true;
        }
    }

    /// Overwrite parts of the timer.
    pub const fn update_timer(&mut self, patch: FocusTimerPatch) {
        patch.apply(&mut self.timer);
    }

    /// Add [`EXTENSION_SECS`] to both the remaining time and the duration.
    pub const fn extend(&mut self) {
        self.timer.time_left = self.timer.time_left.saturating_add(EXTENSION_SECS);
        self.timer.duration = self.timer.duration.saturating_add(EXTENSION_SECS);
    }

    /// Count down `elapsed` seconds of a running timer.
    ///
    /// Returns `true` when this tick ran the timer out; the countdown then
    /// stops while the session stays open.
    pub const fn tick(&mut self, elapsed: u64) -> bool {
        if !self.active || !self.timer.is_running {
            return false;
        }
        self.timer.time_left = self.timer.time_left.saturating_sub(elapsed);
        if self.timer.time_left == 0 {
            self.timer.is_running = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner_with_task_and_note() -> (PlannerState, TaskId, NoteId) {
        let mut planner = PlannerState::default();
        let (task, _) = planner.add_task(None, "Write outline");
        let (note, _) = planner.add_note(None, "Scratch");
        (planner, task, note)
    }

    #[test]
    fn starting_on_a_task_runs_a_fresh_timer() {
        let (planner, task, _) = planner_with_task_and_note();
        let mut focus = FocusState::default();
        assert!(focus.start(Some(FocusTarget::Task(task.clone())), &planner));

        assert!(focus.is_active());
        assert!(!focus.is_minimized());
        assert_eq!(focus.target(), Some(&FocusTarget::Task(task)));
        assert_eq!(
            *focus.timer(),
            FocusTimer {
                duration: DEFAULT_FOCUS_SECS,
                time_left: DEFAULT_FOCUS_SECS,
                is_running: true,
            }
        );
    }

    #[test]
    fn free_form_sessions_wait_for_restore() {
        let (planner, _, note) = planner_with_task_and_note();
        let mut focus = FocusState::default();
        assert!(focus.start(None, &planner));
        assert!(focus.is_active());
        assert!(focus.target().is_none());
        assert!(!focus.timer().is_running);

        assert!(focus.start(Some(FocusTarget::Note(note)), &planner));
        assert!(focus.timer().is_running);
    }

    #[test]
    fn unknown_targets_leave_the_session_alone() {
        let (planner, task, _) = planner_with_task_and_note();
        let mut focus = FocusState::default();
        assert!(focus.start(Some(FocusTarget::Task(task)), &planner));
        focus.tick(60);
        let before = focus.clone();

        assert!(!focus.start(Some(FocusTarget::Task(TaskId::new())), &planner));
        assert!(!focus.start(Some(FocusTarget::Note(NoteId::new())), &planner));
        assert_eq!(focus, before);
    }

    #[test]
    fn minimize_pauses_and_restore_resumes() {
        let (planner, task, _) = planner_with_task_and_note();
        let mut focus = FocusState::default();
        focus.start(Some(FocusTarget::Task(task)), &planner);

        focus.minimize();
        assert!(focus.is_minimized());
        assert!(!focus.tick(DEFAULT_FOCUS_SECS));
        assert_eq!(focus.timer().time_left, DEFAULT_FOCUS_SECS);

        focus.restore();
        assert!(!focus.is_minimized());
        assert!(!focus.tick(30));
        assert_eq!(focus.timer().time_left, DEFAULT_FOCUS_SECS - 30);
    }

    #[test]
    fn extend_grows_remaining_time_and_duration() {
        let (planner, task, _) = planner_with_task_and_note();
        let mut focus = FocusState::default();
        focus.start(Some(FocusTarget::Task(task)), &planner);
        focus.tick(100);

        focus.extend();
        assert_eq!(focus.timer().time_left, DEFAULT_FOCUS_SECS - 100 + EXTENSION_SECS);
        assert_eq!(focus.timer().duration, DEFAULT_FOCUS_SECS + EXTENSION_SECS);
    }

    #[test]
    fn running_out_stops_the_countdown_once() {
        let (planner, task, _) = planner_with_task_and_note();
        let mut focus = FocusState::default();
        focus.start(Some(FocusTarget::Task(task)), &planner);

        assert!(focus.tick(DEFAULT_FOCUS_SECS + 10));
        assert_eq!(focus.timer().time_left, 0);
        assert!(!focus.timer().is_running);
        assert!(focus.is_active());
        assert!(!focus.tick(1));
    }

    #[test]
    fn stop_closes_the_session_and_keeps_counts() {
        let (planner, _, note) = planner_with_task_and_note();
        let mut focus = FocusState::default();
        focus.start(Some(FocusTarget::Note(note)), &planner);
        focus.tick(90);
        focus.minimize();

        focus.stop();
        assert!(!focus.is_active());
        assert!(!focus.is_minimized());
        assert!(focus.target().is_none());
        assert!(!focus.timer().is_running);
        assert_eq!(focus.timer().time_left, DEFAULT_FOCUS_SECS - 90);

        focus.restore();
        assert!(!focus.timer().is_running);
    }

    #[test]
    fn timer_updates_touch_only_given_fields() {
        let mut focus = FocusState::default();
        focus.update_timer(FocusTimerPatch {
            time_left: Some(42),
            ..FocusTimerPatch::default()
        });
        assert_eq!(focus.timer().time_left, 42);
        assert_eq!(focus.timer().duration, DEFAULT_FOCUS_SECS);
        assert!(!focus.timer().is_running);
    }

    #[test]
    fn session_serializes_in_camel_case() {
        let (planner, task, _) = planner_with_task_and_note();
        let mut focus = FocusState::default();
        focus.start(Some(FocusTarget::Task(task.clone())), &planner);
        let json = serde_json::to_value(&focus).unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(json["timer"]["timeLeft"], DEFAULT_FOCUS_SECS);
        assert_eq!(json["target"]["kind"], "task");
        assert_eq!(json["target"]["id"], task.to_string());
    }
}
