use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),

    #[error("Decompression error")]
    Decompression,

    #[error("Corrupted model artifact")]
    Corrupted,

    #[error("Not a model artifact (bad magic bytes)")]
    BadMagic,

    #[error("Version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Checksum mismatch")]
    ChecksumMismatch,

    #[error("Model artifact not found: {path}")]
    FileNotFound { path: String },
}

impl ArtifactError {
    /// Whether retraining is the only way forward (as opposed to a transient IO failure).
    pub fn requires_retrain(&self) -> bool {
        !matches!(self, ArtifactError::Io(_) | ArtifactError::Serialization(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_retrain() {
        let transient = ArtifactError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "locked",
        ));
        assert!(!transient.requires_retrain());

        assert!(ArtifactError::ChecksumMismatch.requires_retrain());
        assert!(ArtifactError::Corrupted.requires_retrain());
        assert!(ArtifactError::VersionMismatch {
            found: 1,
            expected: 2
        }
        .requires_retrain());
        assert!(ArtifactError::FileNotFound {
            path: "fight_model.hamd".to_string()
        }
        .requires_retrain());
    }
}
