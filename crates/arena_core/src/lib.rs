//! # arena_core - Hero Fight Outcome Predictor
//!
//! Learns "who wins?" between two heroes from their attribute profiles.
//!
//! ## Pipeline
//! - `roster`: load and clean the hero attribute table (CSV)
//! - `matchup`: synthesize labeled pairs from a seeded RNG
//! - `classifier`: train a random forest over signed attribute differences
//! - `artifact`: persist the trained model (MessagePack + LZ4 + SHA256)
//! - `predictor`: name two heroes, get a winner and the attributes that decided it
//! - `stats`: running win/loss tallies fed by the predictor
//!
//! Same seed, same roster, same model.

// Label/vote tie-breaks compare floats exactly on purpose
#![allow(clippy::float_cmp)]

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod matchup;
pub mod predictor;
pub mod roster;
pub mod stats;

pub use artifact::{load_artifact, load_model, save_model, ArtifactError, ArtifactInfo, ModelEnvelope};
pub use classifier::{train, ForestConfig, ForestModel, Prediction};
pub use config::{ArenaConfig, ConfigError, SynthesisConfig, CONFIG_PATH_ENV};
pub use error::{CoreError, ErrorKind, LoadError, Result};
pub use features::{transform, FeatureVector};
pub use matchup::{synthesize, Matchup, Outcome, TrainingSet};
pub use predictor::{FightOutcome, Predictor, ResultRecorder};
pub use roster::{load_roster, write_clean_table, AttributeSchema, CoreAttribute, Hero, Roster};
pub use stats::{HeroRecord, StatsBook, StatsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
