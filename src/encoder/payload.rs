//! Artifact to payload conversion
//!
//! Reads a native file and produces `{ audio|image, ext, mimeType }`.

use crate::capture::Artifact;
use base64::engine::general_purpose;
use base64::Engine;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::PathBuf;
use thiserror::Error;

/// Encoder errors
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Invalid artifact location: {0}")]
    InvalidLocation(String),

    #[error("Failed to read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid base64 data: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Which capability produced an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Image,
}

impl MediaKind {
    /// Field name carrying the base64 data
    pub fn field(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Image => "image",
        }
    }
}

/// Transport-encoded representation of an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub kind: MediaKind,
    /// Standard-alphabet base64 of the artifact bytes
    pub data: String,
    /// Trailing extension of the artifact path, without the dot
    pub ext: String,
    pub mime_type: String,
}

impl Payload {
    /// Render as `data:<mime>;base64,<data>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decode the base64 data back into the artifact bytes
    pub fn decode(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(general_purpose::STANDARD.decode(&self.data)?)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(self.kind.field(), &self.data)?;
        map.serialize_entry("ext", &self.ext)?;
        map.serialize_entry("mimeType", &self.mime_type)?;
        map.end()
    }
}

/// Encode a native artifact into a payload
///
/// Stateless: every call reads the file fresh. The caller decides what
/// to do with failures.
pub async fn encode_artifact(
    artifact: &Artifact,
    kind: MediaKind,
    mime_type: &str,
) -> Result<Payload, EncodeError> {
    let path = artifact.to_path()?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|source| EncodeError::Unreadable {
            path: path.clone(),
            source,
        })?;

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();

    tracing::debug!(
        "Encoded {} artifact {:?}: {} bytes",
        kind.field(),
        path,
        bytes.len()
    );

    Ok(Payload {
        kind,
        data: general_purpose::STANDARD.encode(&bytes),
        ext,
        mime_type: mime_type.to_string(),
    })
}

/// Remove a delivered artifact from disk
///
/// Failures are logged and otherwise ignored; the payload has already
/// reached the web content.
pub async fn discard_artifact(artifact: &Artifact) {
    let path = match artifact.to_path() {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("Not removing artifact {}: {}", artifact.uri, e);
            return;
        }
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!("Removed delivered artifact {:?}", path),
        Err(e) => tracing::warn!("Failed to remove artifact {:?}: {}", path, e),
    }
}
