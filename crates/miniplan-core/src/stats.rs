use serde::Serialize;
use time::{Duration, OffsetDateTime, Time};

use crate::planner::PlannerState;

/// Hour at which a planner day begins.
pub const DAY_START_HOUR: u8 = 6;

/// Summary counters for the current planner day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// Live tasks not yet completed.
    pub open_tasks: usize,
    /// Tasks (live or archived) completed inside the current day window.
    pub completed_today: usize,
    /// Completed subtasks across live tasks.
    pub completed_subtasks: usize,
    /// All subtasks across live tasks.
    pub total_subtasks: usize,
}

/// The `[start, end)` window of the planner day containing `now`, in `now`'s offset.
#[must_use]
pub fn day_window(now: OffsetDateTime) -> (OffsetDateTime, OffsetDateTime) {
    let start_time = Time::from_hms(DAY_START_HOUR, 0, 0).unwrap_or(Time::MIDNIGHT);
    let mut start = now.replace_time(start_time);
    if now.hour() < DAY_START_HOUR {
        start -= Duration::days(1);
    }
    (start, start + Duration::days(1))
}

impl DailyStats {
    /// Compute the counters for the day containing `now`.
    #[must_use]
    pub fn compute(state: &PlannerState, now: OffsetDateTime) -> Self {
        let (start, end) = day_window(now);
        let completed_today = state
            .tasks()
            .iter()
            .chain(state.archived_tasks())
            .filter_map(|task| task.completed_at)
            .filter(|at| *at >= start && *at < end)
            .count();
        let open_tasks = state.tasks().iter().filter(|task| !task.completed).count();
        let (completed_subtasks, total_subtasks) =
            state
                .tasks()
                .iter()
                .flat_map(|task| &task.subtasks)
                .fold((0, 0), |(done, total), subtask| {
                    (done + usize::from(subtask.completed), total + 1)
                });
        Self {
            open_tasks,
            completed_today,
            completed_subtasks,
            total_subtasks,
        }
    }
}
