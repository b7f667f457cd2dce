//! Host configuration
//!
//! Loaded from an optional camelCase JSON file, then environment
//! overrides. Every field has a default so an empty file is valid.

use crate::capture::RecordingOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides the web content location
pub const CONTENT_URL_ENV: &str = "CAPTURE_BRIDGE_CONTENT_URL";

/// Overrides the directory simulated devices write artifacts to
pub const ARTIFACT_DIR_ENV: &str = "CAPTURE_BRIDGE_ARTIFACT_DIR";

/// Port the development web content is served on
const CONTENT_PORT: u16 = 3000;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Platform variant hosting the web content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Desktop,
}

impl Platform {
    /// Platform this binary was built for
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Desktop
        }
    }

    /// Loopback address of the development server as seen from the device
    pub fn default_content_url(&self) -> String {
        match self {
            // The Android emulator reaches the host machine through 10.0.2.2
            Platform::Android => format!("http://10.0.2.2:{CONTENT_PORT}"),
            Platform::Ios | Platform::Desktop => format!("http://localhost:{CONTENT_PORT}"),
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// Shape of the `onTakePhoto` data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhotoPayloadShape {
    /// `data:image/jpeg;base64,<data>` string
    DataUri,
    /// `{ image, ext, mimeType }`, same envelope as audio
    Envelope,
}

/// Behaviour of the bridge and its controllers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// Emit `onError` for failures that would otherwise leave a request
    /// without any completion event
    pub report_failures: bool,

    pub photo_payload: PhotoPayloadShape,

    /// Dismiss the camera once a photo has been delivered
    pub close_camera_after_capture: bool,

    pub recording: RecordingOptions,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            report_failures: true,
            photo_payload: PhotoPayloadShape::DataUri,
            close_camera_after_capture: true,
            recording: RecordingOptions::default(),
        }
    }
}

/// Full host configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostConfig {
    pub platform: Platform,

    /// Explicit web content location; derived from the platform when unset
    pub content_url: Option<String>,

    /// Where simulated devices write artifacts; system temp dir when unset
    pub artifact_dir: Option<PathBuf>,

    pub bridge: BridgeConfig,
}

impl HostConfig {
    /// Load from an optional file and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                let config: HostConfig = serde_json::from_str(&content)?;
                tracing::debug!("Loaded config from {:?}", path);
                config
            }
            None => HostConfig::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(CONTENT_URL_ENV).filter(|v| !v.is_empty()) {
            self.content_url = Some(url);
        }
        if let Some(dir) = lookup(ARTIFACT_DIR_ENV).filter(|v| !v.is_empty()) {
            self.artifact_dir = Some(PathBuf::from(dir));
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.content_url();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "content url must be http(s): {url}"
            )));
        }
        if self.bridge.recording.extension.is_empty() {
            return Err(ConfigError::Invalid(
                "recording extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Web content location for this host
    pub fn content_url(&self) -> String {
        self.content_url
            .clone()
            .unwrap_or_else(|| self.platform.default_content_url())
    }

    pub fn artifact_dir(&self) -> PathBuf {
        self.artifact_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("capture-bridge"))
    }
}
