//! Canonical attribute layout shared by matchup synthesis and prediction.
//!
//! The column order is fixed once, when the roster is loaded, and every
//! consumer borrows it from the [`Roster`](super::Roster). Continuous scores
//! always come first in [`CONTINUOUS_COLUMNS`] order, followed by capability
//! flags in source column order.

use serde::{Deserialize, Serialize};

/// Column holding the unique hero name.
pub const NAME_COLUMN: &str = "name";

/// Source columns starting with this prefix are boolean capability flags.
pub const FLAG_PREFIX: &str = "has_";

/// Ground-truth score used to label synthetic matchups.
pub const OVERALL_COLUMN: &str = "overall_score";

/// Required continuous scores, in canonical order.
pub const CONTINUOUS_COLUMNS: [&str; 7] = [
    "intelligence_score",
    "strength_score",
    "speed_score",
    "durability_score",
    "power_score",
    "combat_score",
    OVERALL_COLUMN,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSchema {
    columns: Vec<String>,
}

impl AttributeSchema {
    /// Build the canonical layout: continuous scores, then `flags` as given.
    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: Vec<String> = CONTINUOUS_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(flags.into_iter().map(Into::into));
        Self { columns }
    }

    /// Schema with no capability flags.
    pub fn continuous_only() -> Self {
        Self::new(std::iter::empty::<String>())
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn flag_columns(&self) -> &[String] {
        &self.columns[CONTINUOUS_COLUMNS.len()..]
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn overall_index(&self) -> usize {
        CONTINUOUS_COLUMNS.len() - 1
    }
}

/// Continuous attributes eligible for the ranked advantage explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreAttribute {
    Strength,
    Durability,
    Power,
    Speed,
    Combat,
    Intelligence,
}

impl CoreAttribute {
    /// Ranking order; earlier entries win ties on equal magnitude.
    pub const ALL: [CoreAttribute; 6] = [
        CoreAttribute::Strength,
        CoreAttribute::Durability,
        CoreAttribute::Power,
        CoreAttribute::Speed,
        CoreAttribute::Combat,
        CoreAttribute::Intelligence,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CoreAttribute::Strength => "strength",
            CoreAttribute::Durability => "durability",
            CoreAttribute::Power => "power",
            CoreAttribute::Speed => "speed",
            CoreAttribute::Combat => "combat",
            CoreAttribute::Intelligence => "intelligence",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            CoreAttribute::Strength => "strength_score",
            CoreAttribute::Durability => "durability_score",
            CoreAttribute::Power => "power_score",
            CoreAttribute::Speed => "speed_score",
            CoreAttribute::Combat => "combat_score",
            CoreAttribute::Intelligence => "intelligence_score",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CoreAttribute::Strength => "Strength",
            CoreAttribute::Durability => "Durability",
            CoreAttribute::Power => "Power",
            CoreAttribute::Speed => "Speed",
            CoreAttribute::Combat => "Combat",
            CoreAttribute::Intelligence => "Intelligence",
        }
    }
}

impl std::fmt::Display for CoreAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
