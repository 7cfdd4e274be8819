use std::fs::{rename, File};
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::ArtifactError;
use super::format::{checksum_hex, decode_model, encode_model, ModelEnvelope};
use super::ARTIFACT_VERSION;
use crate::classifier::ForestModel;
use crate::config::SynthesisConfig;

/// Summary of a written artifact, for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub version: u32,
    /// SHA256 of the whole file (hex)
    pub checksum: String,
    pub size_bytes: u64,
    pub n_trees: usize,
    pub width: usize,
}

/// Write `model`, with the synthesis settings it was trained on, to `path`
/// atomically (temp file, fsync, rename).
pub fn save_model(
    model: &ForestModel,
    synthesis: &SynthesisConfig,
    path: &Path,
) -> Result<ArtifactInfo, ArtifactError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let data = encode_model(model, synthesis)?;

    let temp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(&data)?;
        file.flush()?;
        file.sync_all()?;
    }
    rename(&temp_path, path)?;

    info!(
        "Saved model ({} trees, {} features, {} bytes) to {}",
        model.trees().len(),
        model.width(),
        data.len(),
        path.display()
    );

    Ok(ArtifactInfo {
        version: ARTIFACT_VERSION,
        checksum: checksum_hex(&data),
        size_bytes: data.len() as u64,
        n_trees: model.trees().len(),
        width: model.width(),
    })
}

/// Read and verify a model written by [`save_model`].
pub fn load_model(path: &Path) -> Result<ForestModel, ArtifactError> {
    load_artifact(path).map(|envelope| envelope.model)
}

/// Like [`load_model`], keeping the save time and synthesis settings.
pub fn load_artifact(path: &Path) -> Result<ModelEnvelope, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut data = Vec::new();
    File::open(path)?.read_to_end(&mut data)?;

    let envelope = decode_model(&data)?;

    debug!(
        "Loaded model saved at {} ({} bytes) from {}",
        envelope.saved_at,
        data.len(),
        path.display()
    );
    Ok(envelope)
}
