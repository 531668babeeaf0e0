//! Application layer for miniplan.
//!
//! Wires the core reducers to persistence and stream notifications, and
//! provides configuration and filtering shared by front ends.

pub mod bridge;
pub mod config;
pub mod filter;
pub mod service;
pub mod store;
pub mod worker;

// Re-exports for convenience
pub use bridge::{BridgeCall, HookBridge, NoopBridge, NotificationBridge, RecordingBridge, StreamSettings};
pub use config::{AppConfig, MusicConfig, StreamConfig};
pub use filter::{FilterBuildError, GroupSelector, StatusFilter, TaskFilter, TaskFilterBuilder};
pub use service::PlannerService;
pub use store::{KeyValueStore, MemoryStore};
pub use worker::{Effect, EffectQueue};
