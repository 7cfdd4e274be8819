use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::tree::{DecisionTree, TreeParams};
use crate::error::{CoreError, Result};
use crate::features::FeatureVector;
use crate::matchup::{Outcome, TrainingSet};
use crate::roster::AttributeSchema;

/// Random forest settings. Defaults: 100 fully
/// grown bootstrap trees, `sqrt(width)` features per split, seed 42.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    /// `None` grows trees until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features evaluated per split; `None` = `sqrt(width)`
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.n_trees == 0 {
            return Err("n_trees must be at least 1".to_string());
        }
        if self.min_samples_split < 2 {
            return Err("min_samples_split must be at least 2".to_string());
        }
        if self.max_features == Some(0) {
            return Err("max_features must be at least 1".to_string());
        }
        if self.max_depth == Some(0) {
            return Err("max_depth must be at least 1".to_string());
        }
        Ok(())
    }

    fn features_per_split(&self, width: usize) -> usize {
        match self.max_features {
            Some(n) => n.min(width),
            None => ((width as f64).sqrt() as usize).max(1),
        }
    }
}

/// Majority-vote result for one feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub outcome: Outcome,
    pub votes_a: u32,
    pub votes_b: u32,
}

impl Prediction {
    /// Share of trees voting for the predicted outcome.
    pub fn confidence(&self) -> f64 {
        let total = self.votes_a + self.votes_b;
        if total == 0 {
            return 0.0;
        }
        let winning = match self.outcome {
            Outcome::AWins => self.votes_a,
            Outcome::BWins => self.votes_b,
        };
        winning as f64 / total as f64
    }
}

/// Trained bagged-tree model. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    trees: Vec<DecisionTree>,
    /// Column names of the schema the model was trained on
    columns: Vec<String>,
    config: ForestConfig,
    trained_rows: usize,
}

impl ForestModel {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn trained_rows(&self) -> usize {
        self.trained_rows
    }

    /// Classify one feature vector. Its length must equal the training width.
    pub fn predict(&self, features: &[f64]) -> Result<Prediction> {
        if features.len() != self.width() {
            return Err(CoreError::Shape {
                expected: self.width(),
                found: features.len(),
            });
        }

        let votes_a = self
            .trees
            .iter()
            .filter(|tree| tree.predict(features) == Outcome::AWins)
            .count() as u32;
        let votes_b = self.trees.len() as u32 - votes_a;

        Ok(Prediction {
            outcome: super::tree::majority(&[votes_b, votes_a]),
            votes_a,
            votes_b,
        })
    }

    pub fn predict_batch(&self, rows: &[FeatureVector]) -> Result<Vec<Prediction>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    /// Fraction of `set` classified correctly.
    pub fn accuracy(&self, set: &TrainingSet) -> Result<f64> {
        if set.is_empty() {
            return Err(CoreError::InvalidParameter(
                "accuracy needs at least one row".to_string(),
            ));
        }
        let correct = self
            .predict_batch(&set.rows)?
            .iter()
            .zip(&set.labels)
            .filter(|(prediction, label)| prediction.outcome == **label)
            .count();
        Ok(correct as f64 / set.len() as f64)
    }

    /// Structural sanity of a model read from outside: at least one tree,
    /// and every tree walkable for vectors of this model's width.
    pub fn check_structure(&self) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("model has no trees".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.check_structure(self.width())
                .map_err(|reason| format!("tree {idx}: {reason}"))?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn from_parts(trees: Vec<DecisionTree>, columns: Vec<String>) -> Self {
        Self {
            trees,
            columns,
            config: ForestConfig::default(),
            trained_rows: 0,
        }
    }
}

/// Fit a forest on `set`, whose rows must follow `schema`.
///
/// Per-tree seeds are drawn up front from `config.seed`, so the parallel fit
/// yields the same model as a sequential one.
pub fn train(set: &TrainingSet, schema: &AttributeSchema, config: &ForestConfig) -> Result<ForestModel> {
    config.validate().map_err(CoreError::InvalidParameter)?;

    if set.is_empty() {
        return Err(CoreError::InvalidParameter(
            "training set is empty".to_string(),
        ));
    }
    if set.labels.len() != set.rows.len() {
        return Err(CoreError::InvalidParameter(format!(
            "{} labels for {} rows",
            set.labels.len(),
            set.rows.len()
        )));
    }

    let width = schema.width();
    if let Some(row) = set.rows.iter().find(|row| row.len() != width) {
        return Err(CoreError::Shape {
            expected: width,
            found: row.len(),
        });
    }

    let params = TreeParams {
        max_depth: config.max_depth,
        min_samples_split: config.min_samples_split,
        max_features: config.features_per_split(width),
    };

    let started = Instant::now();
    let mut master = ChaCha8Rng::seed_from_u64(config.seed);
    let seeds: Vec<u64> = (0..config.n_trees).map(|_| master.gen()).collect();
    let n = set.len();

    let trees: Vec<DecisionTree> = seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let sample: Vec<usize> = if config.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            DecisionTree::fit(&set.rows, &set.labels, sample, &params, &mut rng)
        })
        .collect();

    info!(
        "Trained {} trees on {} rows x {} features in {:.2?}",
        trees.len(),
        n,
        width,
        started.elapsed()
    );

    Ok(ForestModel {
        trees,
        columns: schema.columns().to_vec(),
        config: config.clone(),
        trained_rows: n,
    })
}
