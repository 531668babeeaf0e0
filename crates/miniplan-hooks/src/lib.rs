//! Stream hook execution for miniplan
//!
//! Changes to the streamed task group are published by running small
//! scripts, one per notification kind, that receive a JSON document on stdin.
//! An overlay server or OBS integration lives behind those scripts.

mod config;
mod error;
mod executor;
mod types;

pub use config::HooksConfig;
pub use error::{HookError, Result};
pub use executor::HookExecutor;
pub use types::{HookContext, HookKind, HookResult, StreamTask};
