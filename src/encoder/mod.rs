//! Artifact encoding module
//!
//! Turns native capture artifacts into base64 payloads the web content
//! can consume.

mod payload;

pub use payload::{discard_artifact, encode_artifact, EncodeError, MediaKind, Payload};

/// Media type attached to recorded audio
pub const AUDIO_MIME_TYPE: &str = "audio/mp4";

/// Media type attached to captured photos
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";
