//! Pipeline configuration
//!
//! Every field has a default, so an empty YAML document (or no file at all)
//! yields the stock pipeline: 5000 synthesized matchups, a 100-tree forest,
//! seed 42 throughout.

use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::classifier::ForestConfig;
use crate::matchup::{synthesize, TrainingSet};
use crate::roster::Roster;

/// Environment variable naming a YAML config file.
pub const CONFIG_PATH_ENV: &str = "ARENA_CONFIG_PATH";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Number of random ordered pairs to label
    pub matchups: usize,
    pub seed: u64,
    /// Share of matchups held back for `evaluate`, in [0, 1)
    pub holdout_fraction: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            matchups: 5000,
            seed: 42,
            holdout_fraction: 0.2,
        }
    }
}

impl SynthesisConfig {
    /// Synthesize matchups over `roster` and split them `(train, holdout)`.
    ///
    /// Deterministic in `self` and the roster: the settings stored with a
    /// model re-create exactly the hold-out set it never saw.
    pub fn training_split(&self, roster: &Roster) -> crate::error::Result<(TrainingSet, TrainingSet)> {
        let matchups = synthesize(roster, self.matchups, self.seed)?;
        let (train, holdout) =
            TrainingSet::from_matchups(&matchups).split(self.holdout_fraction, self.seed)?;
        debug!(
            "Split {} matchups into {} train / {} hold-out",
            matchups.len(),
            train.len(),
            holdout.len()
        );
        Ok((train, holdout))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Raw entity table
    pub source: PathBuf,
    pub model: PathBuf,
    pub clean_table: PathBuf,
    pub stats: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("superheroes_nlp_dataset.csv"),
            model: PathBuf::from("fight_model.hamd"),
            clean_table: PathBuf::from("clean_hero_stats.csv"),
            stats: PathBuf::from("hero_stats.csv"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub synthesis: SynthesisConfig,
    pub forest: ForestConfig,
    pub paths: PathsConfig,
}

impl ArenaConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Config named by `ARENA_CONFIG_PATH`, or defaults when unset or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        let Ok(path) = env::var(CONFIG_PATH_ENV) else {
            return Ok(Self::default());
        };

        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::default());
        }

        Self::load(Path::new(path))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.synthesis.matchups == 0 {
            return Err(ConfigError::Invalid(
                "synthesis.matchups must be positive".to_string(),
            ));
        }

        let fraction = self.synthesis.holdout_fraction;
        if !(0.0..1.0).contains(&fraction) {
            return Err(ConfigError::Invalid(format!(
                "synthesis.holdout_fraction must be in [0, 1), got {fraction}"
            )));
        }

        self.forest
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("forest: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ArenaConfig::default();
        assert_eq!(config.synthesis.matchups, 5000);
        assert_eq!(config.synthesis.seed, 42);
        assert_eq!(config.forest.n_trees, 100);
        assert_eq!(config.forest.seed, 42);
        assert!(config.validate().is_ok());

        assert_eq!(ArenaConfig::from_yaml_str("").unwrap(), config);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
synthesis:
  matchups: 800
forest:
  n_trees: 12
  max_depth: 6
paths:
  model: out/model.hamd
"#;
        let config = ArenaConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.synthesis.matchups, 800);
        assert_eq!(config.synthesis.seed, 42);
        assert_eq!(config.forest.n_trees, 12);
        assert_eq!(config.forest.max_depth, Some(6));
        assert!(config.forest.bootstrap);
        assert_eq!(config.paths.model, PathBuf::from("out/model.hamd"));
        assert_eq!(config.paths.stats, PathBuf::from("hero_stats.csv"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let zero_trees = "forest:\n  n_trees: 0\n";
        assert!(matches!(
            ArenaConfig::from_yaml_str(zero_trees),
            Err(ConfigError::Invalid(_))
        ));

        let full_holdout = "synthesis:\n  holdout_fraction: 1.0\n";
        assert!(matches!(
            ArenaConfig::from_yaml_str(full_holdout),
            Err(ConfigError::Invalid(_))
        ));

        assert!(matches!(
            ArenaConfig::from_yaml_str("synthesis: [1, 2]"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_training_split_depends_on_every_setting() {
        use crate::roster::{AttributeSchema, Hero};

        let schema = AttributeSchema::continuous_only();
        let heroes = (0..10).map(|i| {
            let f = i as f64;
            Hero::new(format!("Hero {i}"), vec![f, 2.0 * f, 50.0 - f, f % 3.0, 7.0, f * f, 40.0 + f])
        });
        let roster = Roster::from_heroes(schema, heroes).unwrap();

        let stored = SynthesisConfig {
            matchups: 300,
            seed: 5,
            holdout_fraction: 0.25,
        };
        let (train, holdout) = stored.training_split(&roster).unwrap();
        assert_eq!((train.len(), holdout.len()), (225, 75));
        assert_eq!(stored.training_split(&roster).unwrap(), (train, holdout.clone()));

        let more = SynthesisConfig {
            matchups: 1200,
            ..stored.clone()
        };
        assert_ne!(more.training_split(&roster).unwrap().1, holdout);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("arena.yaml");
        fs::write(&path, "synthesis:\n  seed: 7\n").unwrap();

        let config = ArenaConfig::load(&path).unwrap();
        assert_eq!(config.synthesis.seed, 7);

        assert!(matches!(
            ArenaConfig::load(&temp_dir.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
