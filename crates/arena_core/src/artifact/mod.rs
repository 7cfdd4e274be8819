// Model artifact persistence
// MessagePack + LZ4 compression with a versioned header and SHA256 integrity check

pub mod error;
pub mod format;
pub mod store;

pub use error::ArtifactError;
pub use format::{decode_model, encode_model, ModelEnvelope};
pub use store::{load_artifact, load_model, save_model, ArtifactInfo};

pub const ARTIFACT_MAGIC: [u8; 4] = *b"HAMD";
/// v2: envelope carries the synthesis settings.
pub const ARTIFACT_VERSION: u32 = 2;
