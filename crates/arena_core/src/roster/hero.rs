use serde::{Deserialize, Serialize};

use super::schema::AttributeSchema;
use crate::error::{CoreError, Result};

/// A named hero with one value per schema column (flags stored as 0.0 / 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    pub name: String,
    values: Vec<f64>,
}

impl Hero {
    /// `values` must follow the roster schema's canonical order.
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Build a hero from named columns; unnamed columns default to 0.
    pub fn from_columns(
        schema: &AttributeSchema,
        name: impl Into<String>,
        columns: &[(&str, f64)],
    ) -> Result<Self> {
        let mut values = vec![0.0; schema.width()];
        for (column, value) in columns {
            let idx = schema.index_of(column).ok_or_else(|| {
                CoreError::InvalidParameter(format!("unknown attribute column '{column}'"))
            })?;
            values[idx] = *value;
        }
        Ok(Self::new(name, values))
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, schema: &AttributeSchema, column: &str) -> Option<f64> {
        schema
            .index_of(column)
            .and_then(|idx| self.values.get(idx).copied())
    }

    pub fn overall(&self, schema: &AttributeSchema) -> f64 {
        self.values[schema.overall_index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns() {
        let schema = AttributeSchema::new(["has_flight"]);
        let hero = Hero::from_columns(
            &schema,
            "Storm",
            &[("overall_score", 88.0), ("has_flight", 1.0)],
        )
        .unwrap();

        assert_eq!(hero.values().len(), 8);
        assert_eq!(hero.overall(&schema), 88.0);
        assert_eq!(hero.value(&schema, "has_flight"), Some(1.0));
        assert_eq!(hero.value(&schema, "speed_score"), Some(0.0));
    }

    #[test]
    fn test_from_columns_rejects_unknown_column() {
        let schema = AttributeSchema::continuous_only();
        let result = Hero::from_columns(&schema, "Storm", &[("charisma_score", 1.0)]);
        assert!(matches!(result, Err(CoreError::InvalidParameter(_))));
    }
}
