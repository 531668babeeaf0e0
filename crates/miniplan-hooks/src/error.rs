//! Hook failures

use std::io;

use crate::HookKind;

/// Result type for hook operations
pub type Result<T> = std::result::Result<T, HookError>;

/// Why a stream hook did not complete
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// The script could not be started or fed its input
    #[error("could not run {} hook: {source}", kind.script_name())]
    Spawn {
        /// Hook that was being run
        kind: HookKind,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// The script outlived the configured time limit and was killed
    #[error("{} hook timed out after {seconds} seconds", kind.script_name())]
    Timeout {
        /// Hook that was being run
        kind: HookKind,
        /// Configured limit
        seconds: u64,
    },

    /// The script exited with a non-zero code
    #[error("{} hook exited with code {code}: {stderr}", kind.script_name())]
    Failed {
        /// Hook that was being run
        kind: HookKind,
        /// Exit code (`-1` when killed by a signal)
        code: i32,
        /// Captured standard error
        stderr: String,
    },

    /// The context could not be encoded for stdin
    #[error("could not encode hook input: {0}")]
    Encode(#[from] serde_json::Error),
}

impl HookError {
    /// Hook the error belongs to, when known
    #[must_use]
    pub const fn kind(&self) -> Option<HookKind> {
        match self {
            Self::Spawn { kind, .. } | Self::Timeout { kind, .. } | Self::Failed { kind, .. } => Some(*kind),
            Self::Encode(_) => None,
        }
    }
}
