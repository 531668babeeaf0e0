use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use miniplan_core::RepeatMode;
use miniplan_core::id::GroupId;
use miniplan_hooks::HooksConfig;
use serde::{Deserialize, Serialize};

use crate::bridge::StreamSettings;

const APP_DIR: &str = "miniplan";
const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the base directory.
pub const DIR_ENV: &str = "MINIPLAN_DIR";

/// Top-level configuration loaded from `<base>/config.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Where bucket snapshots live; relative paths are resolved against the base directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Stream overlay settings.
    pub stream: StreamConfig,
    /// Hook execution settings.
    pub hooks: HooksConfig,
    /// Playback preferences.
    pub music: MusicConfig,
}

/// `[stream]` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Whether the streamed group is mirrored to the overlay.
    pub enabled: bool,
    /// Group mirrored to the overlay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
}

/// `[music]` block.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MusicConfig {
    /// Initial volume in `[0, 1]`.
    pub volume: f64,
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Initial repeat mode.
    pub repeat: RepeatMode,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            volume: miniplan_core::music::DEFAULT_VOLUME,
            shuffle: false,
            repeat: RepeatMode::None,
        }
    }
}

impl AppConfig {
    /// Load configuration from `base`, falling back to defaults when no file exists.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed or fails validation.
    pub fn load(base: impl AsRef<Path>) -> Result<Self> {
        let config_path = base.as_ref().join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to `<base>/config.toml`.
    ///
    /// # Errors
    /// Returns an error when validation fails or the file cannot be written.
    pub fn save(&self, base: impl AsRef<Path>) -> Result<()> {
        self.validate()?;
        let base = base.as_ref();
        fs::create_dir_all(base).with_context(|| format!("failed to create {}", base.display()))?;
        let contents = toml::to_string_pretty(self).context("failed to serialize configuration")?;
        let config_path = base.join(CONFIG_FILE);
        fs::write(&config_path, contents)
            .with_context(|| format!("failed to write {}", config_path.display()))
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.music.volume) {
            bail!("music.volume must be between 0 and 1, got {}", self.music.volume);
        }
        if self.hooks.timeout == 0 {
            bail!("hooks.timeout must be at least one second");
        }
        if self.stream.enabled && self.stream.group.is_none() {
            bail!("stream.enabled requires stream.group to be set");
        }
        Ok(())
    }

    /// Directory holding bucket snapshots.
    #[must_use]
    pub fn data_dir(&self, base: &Path) -> PathBuf {
        match &self.data_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base.join(dir),
            None => base.join("data"),
        }
    }

    /// Stream settings exposed to the notification bridge.
    #[must_use]
    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            enabled: self.stream.enabled,
            stream_group: self.stream.group.clone(),
        }
    }
}

/// Resolve the base directory from an explicit flag, then `MINIPLAN_DIR`, then the platform data dir.
///
/// # Errors
/// Returns an error when no platform data directory is known.
pub fn base_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    resolve_base_dir(explicit, std::env::var_os(DIR_ENV), dirs::data_dir())
}

fn resolve_base_dir(
    explicit: Option<PathBuf>,
    env: Option<OsString>,
    platform: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = env.filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    platform
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| anyhow!("no data directory available; pass --dir or set {DIR_ENV}"))
}
