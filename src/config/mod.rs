//! Configuration schema and loading.
//!
//! YAML with serde defaults: every field is optional and falls back to a
//! hard-coded safe value, so a partial file configures only what it names.
//! A malformed file is a fatal, operator-visible condition — but hosts that
//! prefer to keep running can use [`RespiteConfig::load_or_default`], which
//! logs the failure and continues on defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::damage::DamageRules;
use crate::error::ConfigError;

/// Simulation clock settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimSettings {
    /// Host tick rate, used to convert persisted seconds to ticks and back.
    pub ticks_per_second: u32,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            ticks_per_second: 20,
        }
    }
}

/// Downed-state settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownedSettings {
    /// Seconds from going down to the timeout policy firing.
    pub timer_seconds: u32,
    /// Timeout policy: `true` kills at zero, `false` auto-revives.
    pub death_on_timeout: bool,
    /// Fraction of max health a combatant lands at when downed.
    pub health_floor_percent: f32,
    /// Ticks of held give-up input before the combatant may kill itself.
    pub give_up_ticks: u32,
    /// Which damage sources may still reach a downed combatant.
    pub allowed_damage: DamageRules,
}

impl Default for DownedSettings {
    fn default() -> Self {
        Self {
            timer_seconds: 180,
            death_on_timeout: true,
            health_floor_percent: 0.30,
            give_up_ticks: 80,
            allowed_damage: DamageRules::default(),
        }
    }
}

/// Policy for additional revivers targeting an already-attended combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MultiReviverMode {
    /// Only the first reviver is accepted; later attempts fail.
    #[default]
    FirstOnly,
    /// Later revivers attach as assists that speed up the first attempt.
    Speedup,
}

/// Revive settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReviveSettings {
    /// Seconds a single unassisted revive attempt takes.
    pub timer_seconds: u32,
    /// What happens when a second reviver targets the same combatant.
    pub multi_reviver: MultiReviverMode,
    /// Extra attempt speed per assist in `Speedup` mode
    /// (effective rate = `1 + assists * speedup_per_reviver`).
    pub speedup_per_reviver: f64,
    /// Fraction of max health restored on a completed revive.
    pub heal_percent: f32,
}

impl Default for ReviveSettings {
    fn default() -> Self {
        Self {
            timer_seconds: 10,
            multi_reviver: MultiReviverMode::FirstOnly,
            speedup_per_reviver: 0.5,
            heal_percent: 0.30,
        }
    }
}

/// Top-level Respite configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RespiteConfig {
    /// Simulation clock settings.
    pub sim: SimSettings,
    /// Downed-state settings.
    pub downed: DownedSettings,
    /// Revive settings.
    pub revive: ReviveSettings,
}

impl RespiteConfig {
    /// Full downed countdown in ticks.
    #[must_use]
    pub const fn down_duration_ticks(&self) -> u32 {
        self.downed.timer_seconds * self.sim.ticks_per_second
    }

    /// Single-reviver attempt length in ticks.
    #[must_use]
    pub const fn revive_duration_ticks(&self) -> u32 {
        self.revive.timer_seconds * self.sim.ticks_per_second
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read and
    /// [`ConfigError::ParseError`] if it is not valid YAML for this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_yaml::from_str(&raw).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        for issue in config.warnings() {
            warn!(config = %path.display(), "{issue}");
        }
        Ok(config)
    }

    /// Loads configuration, falling back to defaults on any failure.
    ///
    /// A missing file is expected (first run) and logged at `warn`; a
    /// present-but-broken file is logged at `error` so the operator sees it,
    /// but the host keeps running on safe defaults.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::ReadError { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                warn!(config = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => {
                error!(config = %path.display(), "config invalid, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Returns human-readable warnings for suspect (but loadable) values.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.sim.ticks_per_second == 0 {
            issues.push("sim.ticks_per_second is 0; countdown and revive timers will never run".to_string());
        }
        if self.downed.timer_seconds == 0 {
            issues.push("downed.timer_seconds is 0; combatants resolve on the first tick after going down".to_string());
        }
        if self.revive.timer_seconds == 0 {
            issues.push("revive.timer_seconds is 0; revives complete on the first tick".to_string());
        }
        if !(0.0..=1.0).contains(&self.downed.health_floor_percent) {
            issues.push(format!(
                "downed.health_floor_percent {} is outside [0, 1]",
                self.downed.health_floor_percent
            ));
        }
        if self.revive.speedup_per_reviver < 0.0 {
            issues.push(format!(
                "revive.speedup_per_reviver {} is negative; assists would slow revives down",
                self.revive.speedup_per_reviver
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RespiteConfig::default();
        assert_eq!(config.sim.ticks_per_second, 20);
        assert_eq!(config.downed.timer_seconds, 180);
        assert!(config.downed.death_on_timeout);
        assert_eq!(config.revive.timer_seconds, 10);
        assert_eq!(config.revive.multi_reviver, MultiReviverMode::FirstOnly);
    }

    #[test]
    fn test_duration_helpers() {
        let config = RespiteConfig::default();
        assert_eq!(config.down_duration_ticks(), 3600);
        assert_eq!(config.revive_duration_ticks(), 200);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: RespiteConfig =
            serde_yaml::from_str("downed:\n  timer_seconds: 60\n").unwrap();
        assert_eq!(config.downed.timer_seconds, 60);
        // Everything else stays at default
        assert!(config.downed.death_on_timeout);
        assert_eq!(config.revive.timer_seconds, 10);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<RespiteConfig, _> =
            serde_yaml::from_str("downed:\n  timer_secondz: 60\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_multi_reviver_mode_parse() {
        let config: RespiteConfig =
            serde_yaml::from_str("revive:\n  multi_reviver: speedup\n").unwrap();
        assert_eq!(config.revive.multi_reviver, MultiReviverMode::Speedup);
    }

    #[test]
    fn test_warnings_for_zero_timers() {
        let mut config = RespiteConfig::default();
        config.downed.timer_seconds = 0;
        config.sim.ticks_per_second = 0;
        let issues = config.warnings();
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_no_warnings_on_defaults() {
        assert!(RespiteConfig::default().warnings().is_empty());
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RespiteConfig::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_load_or_default_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("respite.yaml");
        std::fs::write(&path, ":: not yaml ::").unwrap();
        let config = RespiteConfig::load_or_default(&path);
        assert_eq!(config.downed.timer_seconds, 180);
    }

    #[test]
    fn test_round_trip() {
        let config = RespiteConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: RespiteConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.downed.timer_seconds, config.downed.timer_seconds);
    }
}
