//! Simulation tuning, loaded from a JSON5 file.

use std::{fs, io, path::Path};

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG: &str = include_str!("../package-content/rill_config.json5");

/// Failure to load or validate a [`LiquidConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config file I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid JSON5 or has unexpected fields.
    #[error("config file is malformed: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Tuning knobs of the liquid simulation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiquidConfig {
    /// Useful updates per tick.
    pub max_updates_per_tick: usize,
    /// Agitator samples per loaded region and tick.
    pub agitation_samples: usize,
    /// Scheduler swap interval in seconds.
    pub swap_interval: f64,
    /// Cap on reaction redraws.
    pub max_reaction_draws: u32,
    /// Random seed; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for LiquidConfig {
    fn default() -> Self {
        Self {
            max_updates_per_tick: 10,
            agitation_samples: 10,
            swap_interval: 0.2,
            max_reaction_draws: 64,
            seed: None,
        }
    }
}

impl LiquidConfig {
    /// Loads the config at `path`, writing the bundled default there first if
    /// the file does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let config = Self::from_json5(&fs::read_to_string(path)?)?;
            log::info!("Loaded liquid config from {}", path.display());
            return Ok(config);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG)?;
        log::info!("Wrote default liquid config to {}", path.display());
        Self::from_json5(DEFAULT_CONFIG)
    }

    /// Parses and validates a config.
    pub fn from_json5(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json5::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_updates_per_tick == 0 {
            return Err(ConfigError::Invalid("max_updates_per_tick must be at least 1"));
        }
        if !self.swap_interval.is_finite() || self.swap_interval <= 0.0 {
            return Err(ConfigError::Invalid("swap_interval must be a positive number of seconds"));
        }
        if self.max_reaction_draws == 0 {
            return Err(ConfigError::Invalid("max_reaction_draws must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{env, process};

    use super::*;

    #[test]
    fn test_bundled_default_matches_default() {
        let parsed = LiquidConfig::from_json5(DEFAULT_CONFIG).expect("bundled config parses");
        assert_eq!(parsed, LiquidConfig::default());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let parsed = LiquidConfig::from_json5("{ seed: 42, agitation_samples: 0 }").expect("parses");
        assert_eq!(parsed.seed, Some(42));
        assert_eq!(parsed.agitation_samples, 0);
        assert_eq!(parsed.max_updates_per_tick, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            LiquidConfig::from_json5("{ max_updates_per_tick: 0 }"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LiquidConfig::from_json5("{ swap_interval: -1.0 }"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LiquidConfig::from_json5("{ max_reaction_draws: 0 }"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LiquidConfig::from_json5("{ swap_intervall: 1.0 }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = env::temp_dir().join(format!("rill-config-test-{}", process::id()));
        let path = dir.join("rill_config.json5");
        let _ = fs::remove_file(&path);

        let created = LiquidConfig::load_or_create(&path).expect("creates");
        assert!(path.exists());
        assert_eq!(created, LiquidConfig::default());

        fs::write(&path, "{ max_updates_per_tick: 3 }").expect("writes");
        let loaded = LiquidConfig::load_or_create(&path).expect("loads");
        assert_eq!(loaded.max_updates_per_tick, 3);

        let _ = fs::remove_dir_all(&dir);
    }
}
