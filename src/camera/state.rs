//! Camera state

use chrono::{DateTime, Utc};
use std::fmt;

/// Visibility lifecycle of the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraState {
    #[default]
    Closed,
    Open,
    /// Photo capture in flight
    Capturing,
}

impl fmt::Display for CameraState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraState::Closed => write!(f, "closed"),
            CameraState::Open => write!(f, "open"),
            CameraState::Capturing => write!(f, "capturing"),
        }
    }
}

/// The single open camera; exists only while the camera is shown
#[derive(Debug, Clone)]
pub struct CameraSession {
    pub opened_at: DateTime<Utc>,
    /// Photos delivered during this session
    pub photos_taken: u32,
}

impl Default for CameraSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraSession {
    pub fn new() -> Self {
        Self {
            opened_at: Utc::now(),
            photos_taken: 0,
        }
    }
}
