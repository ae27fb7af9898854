//! Configuration loading and validation
//!
//! TOML configuration with serde defaults, so a partial (or absent) file
//! yields a fully populated config. The default location is
//! `~/.replaykit/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Lowest accepted pointer-move sample rate
pub const MIN_SAMPLE_RATE_HZ: u32 = 1;
/// Highest accepted pointer-move sample rate
pub const MAX_SAMPLE_RATE_HZ: u32 = 144;

/// What a capture session records and how densely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Record pointer motion and scrolling
    pub capture_move: bool,
    /// Record pointer button presses and releases
    pub capture_click: bool,
    /// Record key presses and releases
    pub capture_keyboard: bool,
    /// Suppress stationary pointer samples and key auto-repeat
    pub smart_capture: bool,
    /// Pointer-move sampling ceiling; clamped to [1, 144]
    pub sample_rate_hz: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capture_move: true,
            capture_click: true,
            capture_keyboard: true,
            smart_capture: false,
            sample_rate_hz: 60,
        }
    }
}

impl CaptureConfig {
    /// Sample rate forced into the supported range
    pub fn clamped_sample_rate(&self) -> u32 {
        self.sample_rate_hz.clamp(MIN_SAMPLE_RATE_HZ, MAX_SAMPLE_RATE_HZ)
    }
}

/// Engine runtime knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Ingestion queue depth; events beyond it are dropped
    pub queue_capacity: usize,
    /// Status snapshot reuse window
    pub status_debounce_ms: u64,
    /// Background worker threads
    pub worker_threads: usize,
    /// How long a serialize/deserialize job may take before erroring
    pub persist_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: crate::capture::DEFAULT_QUEUE_CAPACITY,
            status_debounce_ms: 100,
            worker_threads: crate::worker::DEFAULT_WORKER_THREADS,
            persist_timeout_secs: 5,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub capture: CaptureConfig,
    pub engine: EngineConfig,
}

impl Config {
    /// Load from `path`, or defaults if the file does not exist.
    pub fn load(path: &PathBuf) -> crate::Result<Self> {
        if !path.exists() {
            debug!(?path, "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)
            .map_err(|e| crate::Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location.
    pub fn load_default() -> crate::Result<Self> {
        Self::load(&Self::default_path()?)
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: &PathBuf) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml())?;
        Ok(())
    }

    /// Write to the default location.
    pub fn save_default(&self) -> crate::Result<PathBuf> {
        let path = Self::default_path()?;
        self.save(&path)?;
        Ok(path)
    }

    /// `~/.replaykit/config.toml`
    pub fn default_path() -> crate::Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| crate::Error::Config("cannot determine home directory".into()))?;
        Ok(home.join(".replaykit").join("config.toml"))
    }

    pub fn to_toml(&self) -> String {
        // serialization of a plain struct tree cannot fail
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.engine.queue_capacity == 0 {
            return Err(crate::Error::Config("queue_capacity must be positive".into()));
        }
        if self.engine.worker_threads == 0 {
            return Err(crate::Error::Config("worker_threads must be positive".into()));
        }
        if self.engine.persist_timeout_secs == 0 {
            return Err(crate::Error::Config(
                "persist_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}
