//! Simulation configuration
//!
//! Loads a [`SimulationConfig`] from a TOML file with sensible defaults.
//! Every field is optional.
//!
//! ## Example TOML
//!
//! ```toml
//! world = [
//!     ["r", "g", "g", "r"],
//!     ["g", "g", "r", "g"],
//! ]
//! blur = 0.05       # motion uncertainty, nominally in [0, 1]
//! p_hit = 200.0     # sensor hit weight (miss weight is 1.0)
//! steps = 10
//! seed = 7
//!
//! [start_pos]
//! row = 1
//! col = 2
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::types::Pose;
use crate::error::LocalizationError;
use crate::grid::ColorGrid;
use crate::simulation::Simulation;

/// Path tried by [`SimulationConfig::load_default`]
pub const DEFAULT_CONFIG_PATH: &str = "configs/simulation.toml";

/// Whole numbers at or above 2^53 do not survive a trip through `f64`
const MAX_EXACT_WHOLE: f64 = 9_007_199_254_740_992.0;

/// Config load error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] basic_toml::Error),

    #[error(transparent)]
    Invalid(#[from] LocalizationError),
}

/// Full simulation configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// World map as rows of color labels
    pub world: Vec<Vec<String>>,

    /// Motion blur factor
    pub blur: f64,

    /// Sensor hit weight
    pub p_hit: f64,

    /// Number of sense/move steps to run
    pub steps: usize,

    /// Seed for the simulation's random source
    pub seed: u64,

    /// Starting pose, the world center when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_pos: Option<Pose>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let world = [
            "rgggrrr",
            "ggrgrgr",
            "grggggr",
            "rrgrggg",
            "rgrgrrr",
        ];

        SimulationConfig {
            world: world
                .iter()
                .map(|row| row.chars().map(String::from).collect())
                .collect(),
            blur: 0.05,
            p_hit: 200.0,
            steps: 10,
            seed: 0,
            start_pos: None,
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Load from the default config path, or fall back to defaults
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Ok(basic_toml::from_str(toml)?)
    }

    /// Override numeric settings by name
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<(), ConfigError> {
        if let Some(&blur) = params.get("blur") {
            if !blur.is_finite() {
                return Err(LocalizationError::invalid_parameter("blur", "must be finite").into());
            }
            self.blur = blur;
        }

        if let Some(&p_hit) = params.get("p_hit") {
            if !p_hit.is_finite() || p_hit < 0.0 {
                return Err(LocalizationError::invalid_parameter(
                    "p_hit",
                    "must be finite and non-negative",
                )
                .into());
            }
            self.p_hit = p_hit;
        }

        if let Some(&steps) = params.get("steps") {
            self.steps = exact_whole("steps", steps)? as usize;
        }

        if let Some(&seed) = params.get("seed") {
            self.seed = exact_whole("seed", seed)?;
        }

        Ok(())
    }

    /// Validate the world map and build the color grid
    pub fn color_grid(&self) -> Result<ColorGrid, ConfigError> {
        Ok(ColorGrid::from_labels(&self.world)?)
    }

    /// Build a seeded simulation from this configuration
    pub fn build(&self) -> Result<Simulation, ConfigError> {
        let world = self.color_grid()?;
        Ok(Simulation::new(
            world,
            self.blur,
            self.p_hit,
            self.start_pos,
            self.seed,
        )?)
    }
}

/// Accept a non-negative whole number that `f64` holds exactly
fn exact_whole(name: &str, value: f64) -> Result<u64, ConfigError> {
    if !(0.0..MAX_EXACT_WHOLE).contains(&value) || value.fract() != 0.0 {
        return Err(LocalizationError::invalid_parameter(
            name,
            format!("must be a whole number in [0, 2^53), got {}", value),
        )
        .into());
    }
    Ok(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.blur, 0.05);
        assert_eq!(config.p_hit, 200.0);
        assert_eq!(config.world.len(), 5);
        assert!(config.world.iter().all(|row| row.len() == 7));
        assert_eq!(config.start_pos, None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml("blur = 0.2\nseed = 9\n").unwrap();
        assert_eq!(config.blur, 0.2);
        assert_eq!(config.seed, 9);
        assert_eq!(config.p_hit, 200.0);
        assert_eq!(config.world, SimulationConfig::default().world);
    }

    #[test]
    fn test_full_toml() {
        let toml = r#"
            world = [["r", "g"], ["g", "r"]]
            blur = 0.1
            p_hit = 3.0
            steps = 4

            [start_pos]
            row = 1
            col = 0
        "#;
        let config = SimulationConfig::from_toml(toml).unwrap();
        assert_eq!(config.world, vec![vec!["r", "g"], vec!["g", "r"]]);
        assert_eq!(config.start_pos, Some(Pose::new(1, 0)));

        let sim = config.build().unwrap();
        assert_eq!(sim.true_pose(), Pose::new(1, 0));
        assert_eq!(sim.localizer().p_hit(), 3.0);
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        assert!(matches!(
            SimulationConfig::from_toml("blur = \"lots\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_ragged_world_is_invalid() {
        let config = SimulationConfig {
            world: vec![vec!["r".into(), "g".into()], vec!["r".into()]],
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.build(),
            Err(ConfigError::Invalid(LocalizationError::RaggedRow { row: 1, .. }))
        ));
    }

    #[test]
    fn test_configure_overrides() {
        let mut config = SimulationConfig::default();
        let mut params = HashMap::new();
        params.insert("blur".to_string(), 0.3);
        params.insert("steps".to_string(), 25.0);
        config.configure(&params).unwrap();
        assert_eq!(config.blur, 0.3);
        assert_eq!(config.steps, 25);

        params.insert("p_hit".to_string(), -1.0);
        assert!(config.configure(&params).is_err());

        let mut bad_steps = HashMap::new();
        bad_steps.insert("steps".to_string(), 2.5);
        assert!(config.configure(&bad_steps).is_err());
    }

    #[test]
    fn test_configure_rejects_inexact_seed() {
        let mut config = SimulationConfig::default();
        let mut params = HashMap::new();
        params.insert("seed".to_string(), 9_007_199_254_740_991.0);
        config.configure(&params).unwrap();
        assert_eq!(config.seed, 9_007_199_254_740_991);

        // 12345678901234567 parses to 12345678901234568.0
        params.insert("seed".to_string(), "12345678901234567".parse().unwrap());
        assert!(matches!(
            config.configure(&params),
            Err(ConfigError::Invalid(LocalizationError::InvalidParameter { .. }))
        ));
        assert_eq!(config.seed, 9_007_199_254_740_991);
    }

    #[test]
    fn test_large_seed_from_toml_is_exact() {
        let config = SimulationConfig::from_toml("seed = 12345678901234567\n").unwrap();
        assert_eq!(config.seed, 12_345_678_901_234_567);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SimulationConfig::load(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
