//! Recording state management
//!
//! Defines the recording state machine and session tracking.

use crate::capture::Artifact;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Current state of the audio recorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingState {
    /// No recording in progress
    Idle,
    /// Native recorder is being allocated
    Preparing,
    /// Currently recording
    Recording,
    /// Recording is paused
    Paused,
    /// Stop issued, waiting for the device
    Stopping,
    /// Device stopped; artifact being encoded
    Stopped(Artifact),
}

impl RecordingState {
    /// A recording exists that stop can end
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
            Self::Stopped(_) => "stopped",
        }
    }
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One uninterrupted stretch of recording between start/resume and
/// pause/stop
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSegment {
    pub index: usize,

    /// Duration of this segment in milliseconds
    pub duration_ms: f64,

    /// Unix timestamp when the segment started
    pub unix_start_ms: i64,

    #[serde(skip)]
    started: Instant,

    #[serde(skip)]
    ended: bool,
}

impl RecordingSegment {
    fn new(index: usize) -> Self {
        Self {
            index,
            duration_ms: 0.0,
            unix_start_ms: Utc::now().timestamp_millis(),
            started: Instant::now(),
            ended: false,
        }
    }

    fn end(&mut self) {
        if !self.ended {
            self.duration_ms = self.started.elapsed().as_secs_f64() * 1000.0;
            self.ended = true;
        }
    }

    fn elapsed_ms(&self) -> f64 {
        if self.ended {
            self.duration_ms
        } else {
            self.started.elapsed().as_secs_f64() * 1000.0
        }
    }
}

/// The single live recording
///
/// Created when the device has actually started, dropped once the stop
/// request has been answered.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    segments: Vec<RecordingSegment>,
    /// Set once the device returns the recorded file
    pub artifact: Option<Artifact>,
}

impl RecordingSession {
    /// Start a session with its first segment running
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            segments: vec![RecordingSegment::new(0)],
            artifact: None,
        }
    }

    /// Close the running segment
    pub fn pause(&mut self) {
        if let Some(segment) = self.segments.last_mut() {
            segment.end();
        }
    }

    /// Open a new segment
    pub fn resume(&mut self) {
        let index = self.segments.len();
        self.segments.push(RecordingSegment::new(index));
    }

    /// Close the running segment and remember where the audio landed
    pub fn finish(&mut self, artifact: Option<Artifact>) {
        self.pause();
        self.artifact = artifact;
    }

    /// Recorded time in milliseconds, excluding paused stretches
    pub fn elapsed_ms(&self) -> f64 {
        self.segments.iter().map(RecordingSegment::elapsed_ms).sum()
    }

    pub fn segments(&self) -> &[RecordingSegment] {
        &self.segments
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_active_states() {
        assert!(RecordingState::Recording.is_active());
        assert!(RecordingState::Paused.is_active());
        assert!(!RecordingState::Idle.is_active());
        assert!(!RecordingState::Preparing.is_active());
        assert!(!RecordingState::Stopped(Artifact::new("/a.m4a")).is_active());
    }

    #[test]
    fn test_pause_excludes_idle_time() {
        let mut session = RecordingSession::new();
        std::thread::sleep(Duration::from_millis(20));
        session.pause();
        let paused_at = session.elapsed_ms();
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(session.elapsed_ms(), paused_at);

        session.resume();
        std::thread::sleep(Duration::from_millis(5));
        session.finish(None);
        assert_eq!(session.segments().len(), 2);
        assert!(session.elapsed_ms() > paused_at);
    }
}
