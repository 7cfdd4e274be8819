use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use super::error::ArtifactError;
use super::{ARTIFACT_MAGIC, ARTIFACT_VERSION};
use crate::classifier::ForestModel;
use crate::config::SynthesisConfig;

const HEADER_LEN: usize = 8;
const CHECKSUM_LEN: usize = 32;

/// Payload stored inside the compressed section.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModelEnvelope {
    /// RFC3339 time the artifact was written
    pub saved_at: String,
    /// Matchup synthesis the model was trained on; reproduces its hold-out set
    pub synthesis: SynthesisConfig,
    pub model: ForestModel,
}

/// Encode a model: `magic | version (u32 LE) | lz4(msgpack(envelope)) | sha256`.
pub fn encode_model(
    model: &ForestModel,
    synthesis: &SynthesisConfig,
) -> Result<Vec<u8>, ArtifactError> {
    let envelope = ModelEnvelope {
        saved_at: chrono::Utc::now().to_rfc3339(),
        synthesis: synthesis.clone(),
        model: model.clone(),
    };

    // 1. Serialize to MessagePack with field names
    let msgpack = to_vec_named(&envelope)?;

    // 2. Header + LZ4 body (size prepended for easy decompression)
    let mut bytes = Vec::with_capacity(HEADER_LEN + msgpack.len() / 2 + CHECKSUM_LEN);
    bytes.extend_from_slice(&ARTIFACT_MAGIC);
    bytes.extend_from_slice(&ARTIFACT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&compress_prepend_size(&msgpack));

    // 3. SHA256 over everything before it
    let checksum = Sha256::digest(&bytes);
    bytes.extend_from_slice(&checksum);

    Ok(bytes)
}

/// Decode and verify an artifact produced by [`encode_model`].
///
/// Beyond the checksum, the decoded trees must be walkable for the model's
/// width; anything else is [`ArtifactError::Corrupted`].
pub fn decode_model(bytes: &[u8]) -> Result<ModelEnvelope, ArtifactError> {
    // Header + LZ4 size prefix + checksum
    if bytes.len() < HEADER_LEN + 4 + CHECKSUM_LEN {
        return Err(ArtifactError::Corrupted);
    }

    let (payload, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    if Sha256::digest(payload).as_slice() != checksum {
        return Err(ArtifactError::ChecksumMismatch);
    }

    if payload[..4] != ARTIFACT_MAGIC {
        return Err(ArtifactError::BadMagic);
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&payload[4..HEADER_LEN]);
    let version = u32::from_le_bytes(version);
    if version != ARTIFACT_VERSION {
        return Err(ArtifactError::VersionMismatch {
            found: version,
            expected: ARTIFACT_VERSION,
        });
    }

    let msgpack =
        decompress_size_prepended(&payload[HEADER_LEN..]).map_err(|_| ArtifactError::Decompression)?;

    let envelope: ModelEnvelope = from_slice(&msgpack)?;
    if let Err(reason) = envelope.model.check_structure() {
        warn!("Rejecting model artifact: {reason}");
        return Err(ArtifactError::Corrupted);
    }

    Ok(envelope)
}

/// Hex SHA256 of an encoded artifact, as reported to users.
pub fn checksum_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
