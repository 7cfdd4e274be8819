//! Matchup Synthesizer
//!
//! Seeded random hero pairs labeled by the ground-truth `overall_score`.
//! Same roster + count + seed = same matchups, in the same order.

use rand::seq::{index, SliceRandom};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::features::{transform, FeatureVector};
use crate::roster::Roster;

/// Which side of an ordered pair wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    AWins,
    BWins,
}

impl Outcome {
    /// A wins only on a strictly greater score; ties go to B.
    pub fn from_scores(a: f64, b: f64) -> Self {
        if a > b {
            Outcome::AWins
        } else {
            Outcome::BWins
        }
    }

    /// Class index used by the classifier: B = 0, A = 1.
    pub fn class_index(self) -> usize {
        match self {
            Outcome::BWins => 0,
            Outcome::AWins => 1,
        }
    }
}

/// One labeled training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub hero_a: String,
    pub hero_b: String,
    pub features: FeatureVector,
    pub outcome: Outcome,
}

/// Draw `count` pairs of distinct heroes and label them.
///
/// A hero never meets itself within a pair but may appear in many pairs.
pub fn synthesize(roster: &Roster, count: usize, seed: u64) -> Result<Vec<Matchup>> {
    if roster.len() < 2 {
        return Err(CoreError::InvalidParameter(format!(
            "matchup synthesis needs at least 2 heroes, roster has {}",
            roster.len()
        )));
    }

    let schema = roster.schema();
    let heroes = roster.heroes();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut matchups = Vec::with_capacity(count);

    for _ in 0..count {
        let pair = index::sample(&mut rng, heroes.len(), 2);
        let a = &heroes[pair.index(0)];
        let b = &heroes[pair.index(1)];

        matchups.push(Matchup {
            hero_a: a.name.clone(),
            hero_b: b.name.clone(),
            features: transform(schema, a, b)?,
            outcome: Outcome::from_scores(a.overall(schema), b.overall(schema)),
        });
    }

    debug!(
        "Synthesized {} matchups from {} heroes (seed {})",
        matchups.len(),
        heroes.len(),
        seed
    );
    Ok(matchups)
}

/// Feature rows and labels, index-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub rows: Vec<FeatureVector>,
    pub labels: Vec<Outcome>,
}

impl TrainingSet {
    pub fn from_matchups(matchups: &[Matchup]) -> Self {
        Self {
            rows: matchups.iter().map(|m| m.features.clone()).collect(),
            labels: matchups.iter().map(|m| m.outcome).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Seeded shuffle split into `(train, holdout)`.
    pub fn split(&self, holdout_fraction: f64, seed: u64) -> Result<(TrainingSet, TrainingSet)> {
        if !(0.0..1.0).contains(&holdout_fraction) {
            return Err(CoreError::InvalidParameter(format!(
                "holdout fraction must be in [0, 1), got {holdout_fraction}"
            )));
        }

        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

        let holdout_len = (self.len() as f64 * holdout_fraction).round() as usize;
        if holdout_len >= self.len() {
            return Err(CoreError::InvalidParameter(format!(
                "holdout of {holdout_len} leaves no training rows out of {}",
                self.len()
            )));
        }

        let pick = |indices: &[usize]| TrainingSet {
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        };
        let (holdout, train) = order.split_at(holdout_len);

        Ok((pick(train), pick(holdout)))
    }
}
