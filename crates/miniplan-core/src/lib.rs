//! Domain model and state transitions for the miniplan planner.

/// Change sets returned by reducers.
pub mod change;
/// Focus sessions.
pub mod focus;
/// Identifier types.
pub mod id;
/// Legacy data upgrades.
pub mod migrate;
/// Entity definitions.
pub mod model;
/// Mood library and play queue.
pub mod music;
/// Task ordering engine.
pub mod ordering;
/// Typed partial updates.
pub mod patch;
/// Planner state and reducers.
pub mod planner;
/// Daily statistics.
pub mod stats;
/// Case-insensitive text search helpers.
pub mod text_matcher;

pub use change::{Bucket, Changes, Notice, Outcome};
pub use focus::{FocusState, FocusTarget, FocusTimer};
pub use music::{MusicState, Playback, RepeatMode, SongMetadata};
pub use ordering::TaskMove;
pub use planner::PlannerState;
pub use stats::DailyStats;
