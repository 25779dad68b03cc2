//! Weight policy and simulation configuration.
//!
//! Loaded from a TOML file with `[weights]` and `[simulation]` tables; every
//! field falls back to its default when omitted.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::Floor;

fn default_individual_max() -> u32 {
    2000
}

fn default_pair_max() -> u32 {
    2600
}

fn default_triple_max() -> u32 {
    3000
}

/// Carrying capacity thresholds for one, two and three robots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WeightPolicy {
    /// Heaviest item a single robot can carry.
    #[serde(default = "default_individual_max")]
    pub individual_max: u32,
    /// Heaviest item a pair of robots can carry.
    #[serde(default = "default_pair_max")]
    pub pair_max: u32,
    /// Heaviest item a team of three can carry.
    #[serde(default = "default_triple_max")]
    pub triple_max: u32,
}

impl WeightPolicy {
    /// Build a policy, rejecting thresholds that are not strictly increasing.
    pub fn new(individual_max: u32, pair_max: u32, triple_max: u32) -> Result<Self, ConfigError> {
        let policy = Self {
            individual_max,
            pair_max,
            triple_max,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.individual_max < self.pair_max && self.pair_max < self.triple_max {
            Ok(())
        } else {
            Err(ConfigError::InvalidThresholds {
                individual_max: self.individual_max,
                pair_max: self.pair_max,
                triple_max: self.triple_max,
            })
        }
    }
}

impl Default for WeightPolicy {
    fn default() -> Self {
        Self {
            individual_max: default_individual_max(),
            pair_max: default_pair_max(),
            triple_max: default_triple_max(),
        }
    }
}

fn default_robots() -> usize {
    3
}

fn default_floors() -> Floor {
    14
}

fn default_mail_items() -> usize {
    40
}

fn default_arrival_window() -> u64 {
    60
}

fn default_priority_ratio() -> f64 {
    0.1
}

fn default_heavy_ratio() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    30006
}

fn default_max_ticks() -> u64 {
    10_000
}

/// Knobs for the demo/benchmark driver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_robots")]
    pub robots: usize,
    #[serde(default = "default_floors")]
    pub floors: Floor,
    #[serde(default = "default_mail_items")]
    pub mail_items: usize,
    /// Ticks over which mail arrivals are spread.
    #[serde(default = "default_arrival_window")]
    pub arrival_window: u64,
    /// Fraction of generated items that carry a priority level.
    #[serde(default = "default_priority_ratio")]
    pub priority_ratio: f64,
    /// Fraction of generated items heavier than a single robot can carry.
    #[serde(default = "default_heavy_ratio")]
    pub heavy_ratio: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Safety stop for the tick loop.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.robots == 0 {
            return Err(ConfigError::InvalidSimulation("robots must be > 0".into()));
        }
        if self.floors == 0 {
            return Err(ConfigError::InvalidSimulation("floors must be > 0".into()));
        }
        if self.arrival_window == 0 {
            return Err(ConfigError::InvalidSimulation(
                "arrival_window must be > 0".into(),
            ));
        }
        for (name, ratio) in [
            ("priority_ratio", self.priority_ratio),
            ("heavy_ratio", self.heavy_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(ConfigError::InvalidSimulation(format!(
                    "{name} must be within 0.0..=1.0, got {ratio}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            robots: default_robots(),
            floors: default_floors(),
            mail_items: default_mail_items(),
            arrival_window: default_arrival_window(),
            priority_ratio: default_priority_ratio(),
            heavy_ratio: default_heavy_ratio(),
            seed: default_seed(),
            max_ticks: default_max_ticks(),
        }
    }
}

/// Complete configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AutomailConfig {
    #[serde(default)]
    pub weights: WeightPolicy,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl AutomailConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.weights.validate()?;
        config.simulation.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_robot_capacities() {
        let policy = WeightPolicy::default();
        assert_eq!(policy.individual_max, 2000);
        assert_eq!(policy.pair_max, 2600);
        assert_eq!(policy.triple_max, 3000);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn rejects_non_increasing_thresholds() {
        assert!(WeightPolicy::new(2000, 2000, 3000).is_err());
        assert!(WeightPolicy::new(2000, 3100, 3000).is_err());
        assert!(WeightPolicy::new(10, 20, 30).is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AutomailConfig::from_toml_str(
            r#"
            [weights]
            pair_max = 2500

            [simulation]
            robots = 5
            "#,
        )
        .expect("valid config");
        assert_eq!(config.weights.individual_max, 2000);
        assert_eq!(config.weights.pair_max, 2500);
        assert_eq!(config.simulation.robots, 5);
        assert_eq!(config.simulation.floors, 14);
    }

    #[test]
    fn invalid_thresholds_in_file_are_rejected() {
        let result = AutomailConfig::from_toml_str("[weights]\nindividual_max = 5000\n");
        assert!(matches!(result, Err(ConfigError::InvalidThresholds { .. })));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[simulation]\nseed = 7\nmail_items = 3").expect("write config");
        let config = AutomailConfig::load(file.path()).expect("load config");
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.mail_items, 3);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AutomailConfig::load(Path::new("/nonexistent/automail.toml"))
            .expect_err("missing file");
        assert!(err.to_string().contains("/nonexistent/automail.toml"));
    }

    #[test]
    fn zero_robots_is_invalid() {
        let result = AutomailConfig::from_toml_str("[simulation]\nrobots = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidSimulation(_))));
    }
}
