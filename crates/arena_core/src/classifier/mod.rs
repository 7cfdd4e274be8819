//! Outcome classifier - bagged CART trees voted by majority
//!
//! `train` is deterministic for a fixed `ForestConfig::seed`; `predict` only
//! accepts vectors exactly as wide as the training rows.

mod forest;
mod tree;

pub use forest::{train, ForestConfig, ForestModel, Prediction};
pub use tree::{DecisionTree, Node};
