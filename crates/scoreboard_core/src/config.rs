//! # Scoreboard Configuration
//!
//! All timing constants and per-deployment choices live here.
//!
//! ```rust
//! use scoreboard_core::config::ScoreboardConfig;
//!
//! let config = ScoreboardConfig::from_yaml_str("sync:\n  ping_interval_ms: 2000\n").unwrap();
//! assert_eq!(config.sync.ping_interval_ms, 2000);
//! assert_eq!(config.sync.mailbox_clear_delay_ms, 50);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::{AdvancePolicy, PERIOD_HISTORY_CAP};
use crate::error::{CoreError, Result};

/// Match State Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Depth of the period undo stack (기본: 10)
    pub period_history_cap: usize,
    /// Match length before any setup is applied, in minutes (기본: 90)
    pub default_match_duration_min: u32,
    /// Period advancement policy for this deployment
    pub advance_policy: AdvancePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            period_history_cap: PERIOD_HISTORY_CAP,
            default_match_duration_min: 90,
            advance_policy: AdvancePolicy::Manual,
        }
    }
}

/// Sync Channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Presence ping period (기본: 5000)
    pub ping_interval_ms: u64,
    /// Delay before the durable mailbox slot is cleared (기본: 50)
    pub mailbox_clear_delay_ms: u64,
    /// Reader poll period for the mailbox and persisted state (기본: 1000)
    pub poll_interval_ms: u64,
    /// Message ids remembered for duplicate suppression (기본: 1024)
    pub dedup_capacity: usize,
    /// Undelivered envelopes buffered per bus subscriber (기본: 256)
    pub bus_queue_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ping_interval_ms: 5_000,
            mailbox_clear_delay_ms: 50,
            poll_interval_ms: 1_000,
            dedup_capacity: 1_024,
            bus_queue_capacity: 256,
        }
    }
}

/// Reader display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Minimum time between rendered frames, ~30 fps (기본: 33)
    pub render_interval_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { render_interval_ms: 33 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScoreboardConfig {
    pub engine: EngineConfig,
    pub sync: SyncConfig,
    pub display: DisplayConfig,
}

impl ScoreboardConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sync.dedup_capacity == 0 {
            return Err(CoreError::ValidationError("sync.dedup_capacity must be > 0".to_string()));
        }
        if self.sync.bus_queue_capacity == 0 {
            return Err(CoreError::ValidationError(
                "sync.bus_queue_capacity must be > 0".to_string(),
            ));
        }
        if self.sync.ping_interval_ms == 0 || self.sync.poll_interval_ms == 0 {
            return Err(CoreError::ValidationError("sync intervals must be > 0".to_string()));
        }
        if self.engine.default_match_duration_min == 0 {
            return Err(CoreError::ValidationError(
                "engine.default_match_duration_min must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScoreboardConfig::default();
        assert_eq!(config.engine.period_history_cap, 10);
        assert_eq!(config.engine.advance_policy, AdvancePolicy::Manual);
        assert_eq!(config.sync.ping_interval_ms, 5_000);
        assert_eq!(config.sync.poll_interval_ms, 1_000);
        assert_eq!(config.display.render_interval_ms, 33);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial_override() {
        let yaml = "engine:\n  advance_policy: automatic\n  default_match_duration_min: 60\n";
        let config = ScoreboardConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.engine.advance_policy, AdvancePolicy::Automatic);
        assert_eq!(config.engine.default_match_duration_min, 60);
        assert_eq!(config.engine.period_history_cap, 10);
        assert_eq!(config.sync.dedup_capacity, 1_024);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(ScoreboardConfig::from_yaml_str("sync:\n  dedup_capacity: 0\n").is_err());
        assert!(matches!(
            ScoreboardConfig::from_yaml_str("engine: [1, 2"),
            Err(CoreError::ParseError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scoreboard.yaml");
        std::fs::write(&path, "display:\n  render_interval_ms: 16\n").unwrap();
        let config = ScoreboardConfig::load(&path).unwrap();
        assert_eq!(config.display.render_interval_ms, 16);

        let missing = ScoreboardConfig::load(&dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(CoreError::IoError(_))));
    }
}
