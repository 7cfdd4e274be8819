//! Feature Transform
//!
//! An ordered hero pair becomes `value(a) - value(b)` for every schema column,
//! in the schema's canonical order. Training and inference both go through
//! [`transform`], with the schema borrowed from the same roster, so the two
//! can never disagree on column order. The result is anti-symmetric:
//! `transform(a, b) == -transform(b, a)`.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::roster::{AttributeSchema, Hero};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn negated(&self) -> Self {
        Self(self.0.iter().map(|v| -v).collect())
    }
}

impl Deref for FeatureVector {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Signed attribute differences of `a` over `b`.
pub fn transform(schema: &AttributeSchema, a: &Hero, b: &Hero) -> Result<FeatureVector> {
    let width = schema.width();
    for hero in [a, b] {
        if hero.values().len() != width {
            return Err(CoreError::Shape {
                expected: width,
                found: hero.values().len(),
            });
        }
    }

    Ok(FeatureVector(
        a.values()
            .iter()
            .zip(b.values())
            .map(|(x, y)| x - y)
            .collect(),
    ))
}
