//! `[hooks]` section of the configuration file

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::HookKind;

/// Which stream hooks run, where their scripts live and how long they may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    /// Master switch for every hook
    pub enabled: bool,

    /// Hooks switched off individually
    pub disabled: Vec<HookKind>,

    /// Seconds a script may run before it is killed
    pub timeout: u64,

    /// Script directory, relative to the base directory
    pub hooks_dir: PathBuf,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            disabled: Vec::new(),
            timeout: 10,
            hooks_dir: PathBuf::from("hooks"),
        }
    }
}

impl HooksConfig {
    /// Whether scripts for `kind` should run
    #[must_use]
    pub fn runs(&self, kind: HookKind) -> bool {
        self.enabled && !self.disabled.contains(&kind)
    }

    /// Script run time limit
    #[must_use]
    pub const fn time_limit(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
