//! Camera capture controller
//!
//! Shows the camera once permission is granted and turns a one-shot
//! capture into an `onTakePhoto` event.

use super::state::{CameraSession, CameraState};
use crate::bridge::protocol::{EventData, EventKind, OutboundEvent};
use crate::bridge::Outbox;
use crate::capture::{ensure_granted, CameraDevice, Capability, CaptureOptions, PermissionGate};
use crate::config::PhotoPayloadShape;
use crate::encoder::{discard_artifact, encode_artifact, MediaKind, IMAGE_MIME_TYPE};
use crate::utils::{BridgeError, BridgeResult};
use std::sync::Arc;

pub struct CameraController {
    camera: Box<dyn CameraDevice>,
    permissions: Arc<dyn PermissionGate>,
    state: CameraState,
    session: Option<CameraSession>,
    outbox: Outbox,
    photo_payload: PhotoPayloadShape,
    close_after_capture: bool,
}

impl CameraController {
    pub fn new(
        camera: Box<dyn CameraDevice>,
        permissions: Arc<dyn PermissionGate>,
        outbox: Outbox,
        photo_payload: PhotoPayloadShape,
        close_after_capture: bool,
    ) -> Self {
        Self {
            camera,
            permissions,
            state: CameraState::Closed,
            session: None,
            outbox,
            photo_payload,
            close_after_capture,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn session(&self) -> Option<&CameraSession> {
        self.session.as_ref()
    }

    fn guard(&self, action: &'static str, expected: CameraState) -> BridgeResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(BridgeError::InvalidStateTransition {
                action,
                state: self.state.to_string(),
            })
        }
    }

    /// Ask for permission and show the camera
    ///
    /// A denial leaves the camera closed and emits nothing.
    pub async fn open(&mut self) -> BridgeResult<()> {
        self.guard("open camera", CameraState::Closed)?;

        ensure_granted(self.permissions.as_ref(), Capability::Camera).await?;

        self.camera
            .open()
            .await
            .map_err(|e| BridgeError::Device(format!("Failed to open camera: {}", e)))?;

        self.session = Some(CameraSession::new());
        self.state = CameraState::Open;
        tracing::info!("Camera opened");
        Ok(())
    }

    /// Take one photo at minimum quality and deliver it
    pub async fn capture(&mut self, id: Option<String>) -> BridgeResult<()> {
        self.guard("take photo", CameraState::Open)?;

        self.state = CameraState::Capturing;
        let captured = self.camera.capture(CaptureOptions::MINIMUM_QUALITY).await;
        self.state = CameraState::Open;

        let artifact = captured
            .map_err(|e| BridgeError::Device(format!("Failed to capture photo: {}", e)))?
            .ok_or_else(|| {
                BridgeError::ArtifactUnavailable("camera returned no file location".to_string())
            })?;

        let payload = encode_artifact(&artifact, MediaKind::Image, IMAGE_MIME_TYPE).await?;
        let data = match self.photo_payload {
            PhotoPayloadShape::DataUri => EventData::DataUri(payload.data_uri()),
            PhotoPayloadShape::Envelope => EventData::Media(payload),
        };
        self.outbox
            .emit(OutboundEvent::with_data(EventKind::TakePhoto, id, data));
        discard_artifact(&artifact).await;

        if let Some(session) = self.session.as_mut() {
            session.photos_taken += 1;
        }
        tracing::info!("Photo delivered");

        if self.close_after_capture {
            self.dismiss().await;
        }
        Ok(())
    }

    /// Hide the camera; no event is sent
    pub async fn close(&mut self) -> BridgeResult<()> {
        self.guard("close camera", CameraState::Open)?;
        self.dismiss().await;
        Ok(())
    }

    async fn dismiss(&mut self) {
        if let Err(e) = self.camera.close().await {
            tracing::warn!("Failed to close camera preview: {}", e);
        }
        if let Some(session) = self.session.take() {
            tracing::info!(
                "Camera closed after {} photo(s), open since {}",
                session.photos_taken,
                session.opened_at
            );
        }
        self.state = CameraState::Closed;
    }
}
