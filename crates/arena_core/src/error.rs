use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::config::ConfigError;
use crate::stats::StatsError;

/// Failures while building the roster from an entity source.
///
/// All of these are fatal: there is no partial or degraded roster.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Entity source not found: {path}")]
    SourceMissing { path: String },

    #[error("Failed to read entity source {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Entity source {path} is missing required column '{column}'")]
    MissingColumn { path: String, column: String },

    #[error("No valid rows in entity source {path} ({dropped} dropped)")]
    NoValidRows { path: String, dropped: u32 },

    #[error("Hero '{name}' has {found} attribute values, schema expects {expected}")]
    SchemaWidth {
        name: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Hero not found: {name}")]
    NotFound { name: String },

    #[error("Feature vector shape mismatch: expected {expected} columns, found {found}")]
    Shape { expected: usize, found: usize },

    #[error("Model columns differ from roster schema at column {index}: model '{model}', roster '{roster}'")]
    SchemaMismatch {
        index: usize,
        model: String,
        roster: String,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to write cleaned table {path}: {source}")]
    Export {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to record fight result")]
    Recorder(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entity source unusable.
    Load,
    /// Requested hero is not in the roster.
    Lookup,
    /// Feature layout disagrees with the model (stale model or schema drift).
    Shape,
    Other,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Load(_) => ErrorKind::Load,
            CoreError::NotFound { .. } => ErrorKind::Lookup,
            CoreError::Shape { .. } | CoreError::SchemaMismatch { .. } => ErrorKind::Shape,
            _ => ErrorKind::Other,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let load = CoreError::from(LoadError::SourceMissing {
            path: "heroes.csv".to_string(),
        });
        assert_eq!(load.kind(), ErrorKind::Load);

        let lookup = CoreError::NotFound {
            name: "Nobody".to_string(),
        };
        assert_eq!(lookup.kind(), ErrorKind::Lookup);

        let shape = CoreError::Shape {
            expected: 9,
            found: 7,
        };
        assert_eq!(shape.kind(), ErrorKind::Shape);
        assert_eq!(
            shape.to_string(),
            "Feature vector shape mismatch: expected 9 columns, found 7"
        );

        let other = CoreError::InvalidParameter("count".to_string());
        assert_eq!(other.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_missing_column_names_requirement() {
        let err = LoadError::MissingColumn {
            path: "heroes.csv".to_string(),
            column: "overall_score".to_string(),
        };
        assert!(err.to_string().contains("overall_score"));
    }
}
