//! CART decision tree over signed-difference features.
//!
//! Nodes live in a flat arena; node 0 is the root. A sample goes left when
//! `features[feature] <= threshold`.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::matchup::Outcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Training sample counts per class, indexed by [`Outcome::class_index`]
    Leaf { counts: [u32; 2] },
}

impl Node {
    fn leaf(counts: [u32; 2]) -> Self {
        Node::Leaf { counts }
    }
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Non-constant features evaluated per split
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Weighted Gini impurity of the two children (unnormalized)
    score: f64,
}

impl DecisionTree {
    /// Grow a tree on the (possibly repeated) sample indices in `sample`.
    pub(crate) fn fit(
        rows: &[FeatureVector],
        labels: &[Outcome],
        sample: Vec<usize>,
        params: &TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        tree.grow(rows, labels, sample, width, 0, params, rng);
        tree
    }

    pub fn predict(&self, features: &[f64]) -> Outcome {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { counts } => return majority(counts),
            }
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                Node::Leaf { .. } => 0,
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Check that the arena is walkable for `width`-long inputs: features in
    /// range, children inside the arena and after their parent.
    pub(crate) fn check_structure(&self, width: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = *node
            {
                if feature >= width {
                    return Err(format!(
                        "node {idx} splits on feature {feature}, width is {width}"
                    ));
                }
                for child in [left, right] {
                    if child <= idx || child >= len {
                        return Err(format!(
                            "node {idx} points to child {child} ({len} nodes)"
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    #[allow(clippy::too_many_arguments)]
    fn grow(
        &mut self,
        rows: &[FeatureVector],
        labels: &[Outcome],
        sample: Vec<usize>,
        width: usize,
        depth: usize,
        params: &TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let id = self.nodes.len();
        let counts = class_counts(labels, &sample);
        self.nodes.push(Node::leaf(counts));

        let pure = counts[0] == 0 || counts[1] == 0;
        let depth_reached = params.max_depth.is_some_and(|max| depth >= max);
        if pure || depth_reached || sample.len() < params.min_samples_split {
            return id;
        }

        let Some(split) = best_split(rows, labels, &sample, width, params, rng) else {
            return id;
        };

        let (left_sample, right_sample): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| rows[i][split.feature] <= split.threshold);

        let left = self.grow(rows, labels, left_sample, width, depth + 1, params, rng);
        let right = self.grow(rows, labels, right_sample, width, depth + 1, params, rng);

        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }
}

/// Majority class; a tie goes to B, matching the label tie-break.
pub(crate) fn majority(counts: &[u32; 2]) -> Outcome {
    if counts[Outcome::AWins.class_index()] > counts[Outcome::BWins.class_index()] {
        Outcome::AWins
    } else {
        Outcome::BWins
    }
}

fn class_counts(labels: &[Outcome], sample: &[usize]) -> [u32; 2] {
    let mut counts = [0u32; 2];
    for &i in sample {
        counts[labels[i].class_index()] += 1;
    }
    counts
}

/// Gini impurity scaled by sample count: `n * (1 - p0² - p1²)`.
fn weighted_gini(counts: &[u32; 2]) -> f64 {
    let n = (counts[0] + counts[1]) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let p0 = counts[0] as f64 / n;
    let p1 = counts[1] as f64 / n;
    n * (1.0 - p0 * p0 - p1 * p1)
}

/// Scan features in a seeded random order, evaluating up to `max_features`
/// non-constant ones, and keep the lowest-impurity threshold.
fn best_split(
    rows: &[FeatureVector],
    labels: &[Outcome],
    sample: &[usize],
    width: usize,
    params: &TreeParams,
    rng: &mut ChaCha8Rng,
) -> Option<SplitCandidate> {
    let mut order: Vec<usize> = (0..width).collect();
    order.shuffle(rng);

    let total = class_counts(labels, sample);
    let mut sorted = sample.to_vec();
    let mut best: Option<SplitCandidate> = None;
    let mut evaluated = 0;

    for feature in order {
        if evaluated >= params.max_features {
            break;
        }

        sorted.sort_by(|&i, &j| rows[i][feature].total_cmp(&rows[j][feature]));
        let first = rows[sorted[0]][feature];
        let last = rows[sorted[sorted.len() - 1]][feature];
        if first == last {
            continue;
        }
        evaluated += 1;

        let mut left = [0u32; 2];
        for pos in 0..sorted.len() - 1 {
            left[labels[sorted[pos]].class_index()] += 1;

            let here = rows[sorted[pos]][feature];
            let next = rows[sorted[pos + 1]][feature];
            if here == next {
                continue;
            }

            let right = [total[0] - left[0], total[1] - left[1]];
            let score = weighted_gini(&left) + weighted_gini(&right);
            if best.as_ref().map_or(true, |b| score < b.score) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: midpoint(here, next),
                    score,
                });
            }
        }
    }

    best
}

/// Midpoint of two adjacent distinct values, falling back to the lower one
/// when rounding would push it onto the upper value.
fn midpoint(low: f64, high: f64) -> f64 {
    let mid = low + (high - low) / 2.0;
    if mid < high {
        mid
    } else {
        low
    }
}
