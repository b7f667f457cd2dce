//! Audio recording controller
//!
//! Owns the native recorder and the single recording session. Guards every
//! action on the current state so invalid device calls are never issued.

use super::state::{RecordingSession, RecordingState};
use crate::bridge::protocol::{EventData, EventKind, OutboundEvent};
use crate::bridge::Outbox;
use crate::capture::{ensure_granted, AudioRecorder, Capability, PermissionGate, RecordingOptions};
use crate::encoder::{discard_artifact, encode_artifact, MediaKind, AUDIO_MIME_TYPE};
use crate::utils::{BridgeError, BridgeResult};
use std::sync::Arc;

/// Drives the audio recording lifecycle
pub struct AudioController {
    /// Native recorder
    recorder: Box<dyn AudioRecorder>,

    permissions: Arc<dyn PermissionGate>,

    /// Preset passed to every prepare
    options: RecordingOptions,

    state: RecordingState,

    /// Live session, if any
    session: Option<RecordingSession>,

    outbox: Outbox,
}

impl AudioController {
    pub fn new(
        recorder: Box<dyn AudioRecorder>,
        permissions: Arc<dyn PermissionGate>,
        options: RecordingOptions,
        outbox: Outbox,
    ) -> Self {
        Self {
            recorder,
            permissions,
            options,
            state: RecordingState::Idle,
            session: None,
            outbox,
        }
    }

    /// Get the current recording state
    pub fn state(&self) -> &RecordingState {
        &self.state
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    fn guard(&self, action: &'static str, allowed: bool) -> BridgeResult<()> {
        if allowed {
            Ok(())
        } else {
            Err(BridgeError::InvalidStateTransition {
                action,
                state: self.state.to_string(),
            })
        }
    }

    /// Start recording
    ///
    /// `onStartRecord` is emitted only once the device has actually begun.
    pub async fn start(&mut self, id: Option<String>) -> BridgeResult<()> {
        self.guard("start", self.state == RecordingState::Idle)?;

        ensure_granted(self.permissions.as_ref(), Capability::Microphone).await?;

        tracing::info!(
            "Preparing recorder: {} Hz, {} ch, .{}",
            self.options.sample_rate,
            self.options.channels,
            self.options.extension
        );
        self.state = RecordingState::Preparing;

        if let Err(e) = self.recorder.prepare(&self.options).await {
            self.state = RecordingState::Idle;
            return Err(BridgeError::Device(format!("Failed to prepare recorder: {}", e)));
        }
        if let Err(e) = self.recorder.start().await {
            self.state = RecordingState::Idle;
            return Err(BridgeError::Device(format!("Failed to start recorder: {}", e)));
        }

        let session = RecordingSession::new();
        tracing::info!("Recording started (session {})", session.id);
        self.session = Some(session);
        self.state = RecordingState::Recording;

        self.outbox
            .emit(OutboundEvent::signal(EventKind::StartRecord, id));
        Ok(())
    }

    /// Pause recording
    pub async fn pause(&mut self, id: Option<String>) -> BridgeResult<()> {
        self.guard("pause", self.state == RecordingState::Recording)?;

        self.recorder
            .pause()
            .await
            .map_err(|e| BridgeError::Device(format!("Failed to pause recorder: {}", e)))?;

        if let Some(session) = self.session.as_mut() {
            session.pause();
        }
        self.state = RecordingState::Paused;
        tracing::info!("Recording paused");

        self.outbox
            .emit(OutboundEvent::signal(EventKind::PauseRecord, id));
        Ok(())
    }

    /// Resume recording
    pub async fn resume(&mut self, id: Option<String>) -> BridgeResult<()> {
        self.guard("resume", self.state == RecordingState::Paused)?;

        self.recorder
            .resume()
            .await
            .map_err(|e| BridgeError::Device(format!("Failed to resume recorder: {}", e)))?;

        if let Some(session) = self.session.as_mut() {
            session.resume();
        }
        self.state = RecordingState::Recording;
        tracing::info!("Recording resumed");

        self.outbox
            .emit(OutboundEvent::signal(EventKind::ResumeRecord, id));
        Ok(())
    }

    /// Stop recording and deliver the encoded audio
    ///
    /// Whatever happens after the device call, the machine ends up idle
    /// and the session is dropped. The recorded file is removed once its
    /// payload has been handed to the outbox.
    pub async fn stop(&mut self, id: Option<String>) -> BridgeResult<()> {
        self.guard("stop", self.state.is_active())?;

        tracing::info!("Stopping recording");
        self.state = RecordingState::Stopping;

        let stopped = self.recorder.stop().await;
        let mut session = self.session.take();

        let artifact = match stopped {
            Ok(artifact) => artifact,
            Err(e) => {
                self.state = RecordingState::Idle;
                return Err(BridgeError::Device(format!("Failed to stop recorder: {}", e)));
            }
        };

        if let Some(session) = session.as_mut() {
            session.finish(artifact.clone());
            tracing::info!(
                "Recording stopped. Duration: {:.0}ms over {} segment(s)",
                session.elapsed_ms(),
                session.segments().len()
            );
        }

        let Some(artifact) = artifact else {
            self.state = RecordingState::Idle;
            return Err(BridgeError::ArtifactUnavailable(
                "recorder returned no file location".to_string(),
            ));
        };

        self.state = RecordingState::Stopped(artifact.clone());
        let encoded = encode_artifact(&artifact, MediaKind::Audio, AUDIO_MIME_TYPE).await;
        self.state = RecordingState::Idle;
        let payload = encoded?;

        self.outbox.emit(OutboundEvent::with_data(
            EventKind::StopRecord,
            id,
            EventData::Media(payload),
        ));
        discard_artifact(&artifact).await;
        Ok(())
    }
}
