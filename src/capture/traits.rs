//! Capture trait definitions
//!
//! Platform-agnostic seams for the native device subsystems. Each platform
//! backend implements these; the controllers only ever talk to the traits.

use crate::encoder::EncodeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Device capability guarded by a permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Microphone,
    Camera,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Microphone => write!(f, "microphone"),
            Capability::Camera => write!(f, "camera"),
        }
    }
}

/// Outcome of a permission query or request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    /// The user has not been asked yet
    Undetermined,
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Reference to a native file produced by a capture action
///
/// Backends hand out either `file://` URIs or plain filesystem paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub uri: String,
}

impl Artifact {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    pub fn from_path(path: &Path) -> Self {
        Self {
            uri: path.to_string_lossy().to_string(),
        }
    }

    /// Resolve the artifact to a local filesystem path
    pub fn to_path(&self) -> Result<PathBuf, EncodeError> {
        if self.uri.is_empty() {
            return Err(EncodeError::InvalidLocation("empty uri".to_string()));
        }

        match self.uri.strip_prefix("file://") {
            Some(rest) => {
                let decoded = urlencoding::decode(rest)
                    .map_err(|e| EncodeError::InvalidLocation(format!("{}: {}", self.uri, e)))?;
                Ok(PathBuf::from(decoded.into_owned()))
            }
            None if self.uri.contains("://") => {
                Err(EncodeError::InvalidLocation(format!("unsupported scheme: {}", self.uri)))
            }
            None => Ok(PathBuf::from(&self.uri)),
        }
    }
}

/// Recording preset handed to the recorder's prepare step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingOptions {
    /// Container extension, without the dot
    pub extension: String,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels
    pub channels: u16,

    /// Encoder bit rate in bits per second
    pub bit_rate: u32,
}

impl Default for RecordingOptions {
    fn default() -> Self {
        Self {
            extension: "m4a".to_string(),
            sample_rate: 44_100,
            channels: 2,
            bit_rate: 128_000,
        }
    }
}

/// Options for a single photo capture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureOptions {
    /// JPEG quality in 0.0..=1.0
    pub quality: f32,
}

impl CaptureOptions {
    /// Lowest fidelity; keeps payloads small on the bridge channel.
    pub const MINIMUM_QUALITY: CaptureOptions = CaptureOptions { quality: 0.0 };
}

/// Error reported by a native subsystem
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct DeviceError(pub String);

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Permission queries with asynchronous grant/deny outcomes
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Current status without prompting
    async fn check(&self, capability: Capability) -> PermissionStatus;

    /// Prompt the user if needed and return the outcome
    async fn request(&self, capability: Capability) -> PermissionStatus;
}

/// Native audio recorder
#[async_trait]
pub trait AudioRecorder: Send {
    /// Allocate the native recorder and prepare it for the given preset
    async fn prepare(&mut self, options: &RecordingOptions) -> DeviceResult<()>;

    async fn start(&mut self) -> DeviceResult<()>;

    async fn pause(&mut self) -> DeviceResult<()>;

    async fn resume(&mut self) -> DeviceResult<()>;

    /// Stop and unload the recorder, returning the artifact location if
    /// the platform exposes one
    async fn stop(&mut self) -> DeviceResult<Option<Artifact>>;
}

/// Native camera
#[async_trait]
pub trait CameraDevice: Send {
    /// Show the camera preview
    async fn open(&mut self) -> DeviceResult<()>;

    /// Take one photo, returning the artifact location if available
    async fn capture(&mut self, options: CaptureOptions) -> DeviceResult<Option<Artifact>>;

    /// Dismiss the camera preview
    async fn close(&mut self) -> DeviceResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_plain_path() {
        let artifact = Artifact::new("/data/cache/recording.m4a");
        assert_eq!(
            artifact.to_path().unwrap(),
            PathBuf::from("/data/cache/recording.m4a")
        );
    }

    #[test]
    fn test_artifact_file_uri_is_decoded() {
        let artifact = Artifact::new("file:///data/My%20Cache/photo.jpg");
        assert_eq!(
            artifact.to_path().unwrap(),
            PathBuf::from("/data/My Cache/photo.jpg")
        );
    }

    #[test]
    fn test_artifact_rejects_remote_and_empty() {
        assert!(Artifact::new("https://example.com/a.jpg").to_path().is_err());
        assert!(Artifact::new("").to_path().is_err());
    }
}
