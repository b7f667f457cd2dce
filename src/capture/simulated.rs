//! Simulated capture backend
//!
//! File-backed stand-ins for the native subsystems. The headless host uses
//! them when no platform backend is linked, and the tests use the call log
//! to check which native calls were actually issued.

use super::traits::{
    Artifact, AudioRecorder, CameraDevice, Capability, CaptureOptions, DeviceError, DeviceResult,
    PermissionGate, PermissionStatus, RecordingOptions,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Native call issued against a simulated device
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Prepare,
    Start,
    Pause,
    Resume,
    Stop,
    CameraOpen,
    Capture { quality: f32 },
    CameraClose,
}

/// Shared, ordered record of device calls
#[derive(Debug, Clone, Default)]
pub struct DeviceLog {
    calls: Arc<Mutex<Vec<DeviceCall>>>,
}

impl DeviceLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: DeviceCall) {
        tracing::trace!("device call: {:?}", call);
        self.calls.lock().push(call);
    }

    /// Snapshot of all calls so far
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &DeviceCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }
}

/// Permission gate with scripted outcomes
pub struct SimulatedPermissions {
    status: Mutex<HashMap<Capability, PermissionStatus>>,
    /// Outcome of the next prompt
    on_request: PermissionStatus,
    requests: Mutex<HashMap<Capability, usize>>,
}

impl SimulatedPermissions {
    /// Every capability already granted
    pub fn granted() -> Self {
        Self::with_status(PermissionStatus::Granted, PermissionStatus::Granted)
    }

    /// Nothing decided yet; prompts resolve to `outcome`
    pub fn prompting(outcome: PermissionStatus) -> Self {
        Self::with_status(PermissionStatus::Undetermined, outcome)
    }

    fn with_status(initial: PermissionStatus, on_request: PermissionStatus) -> Self {
        let status = [Capability::Microphone, Capability::Camera]
            .into_iter()
            .map(|c| (c, initial))
            .collect();
        Self {
            status: Mutex::new(status),
            on_request,
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Override the stored status of one capability
    pub fn set(&self, capability: Capability, status: PermissionStatus) {
        self.status.lock().insert(capability, status);
    }

    pub fn request_count(&self, capability: Capability) -> usize {
        self.requests.lock().get(&capability).copied().unwrap_or(0)
    }
}

#[async_trait]
impl PermissionGate for SimulatedPermissions {
    async fn check(&self, capability: Capability) -> PermissionStatus {
        self.status
            .lock()
            .get(&capability)
            .copied()
            .unwrap_or(PermissionStatus::Undetermined)
    }

    async fn request(&self, capability: Capability) -> PermissionStatus {
        *self.requests.lock().entry(capability).or_insert(0) += 1;

        let mut status = self.status.lock();
        let current = status.entry(capability).or_insert(PermissionStatus::Undetermined);
        // A prompt only happens while undetermined; a decision sticks.
        if *current == PermissionStatus::Undetermined {
            *current = self.on_request;
        }
        *current
    }
}

/// Fake MPEG-4 audio header followed by the recorded "samples"
const M4A_HEADER: &[u8] = b"\x00\x00\x00\x18ftypM4A \x00\x00\x00\x00";

/// JPEG start-of-image marker
const JPEG_HEADER: &[u8] = b"\xff\xd8\xff\xe0";

/// Bytes of a simulated recording with `segments` start/resume stretches
pub fn render_audio(segments: u32) -> Vec<u8> {
    let mut bytes = M4A_HEADER.to_vec();
    for segment in 0..segments {
        bytes.extend((0..=255u8).map(|b| b.wrapping_add(segment as u8)));
    }
    bytes
}

/// `file://` URI with every path segment percent-encoded
fn file_uri(path: &Path) -> Artifact {
    let encoded = path
        .to_string_lossy()
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    Artifact::new(format!("file://{encoded}"))
}

/// Recorder that writes a small audio file on stop
pub struct SimulatedRecorder {
    output_dir: PathBuf,
    log: DeviceLog,
    latency: Duration,
    extension: String,
    emit_artifact: bool,
    lose_artifact: bool,
    fail_prepare: bool,
    prepared: bool,
    segments: u32,
}

impl SimulatedRecorder {
    pub fn new(output_dir: &Path, log: DeviceLog) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            log,
            latency: Duration::ZERO,
            extension: "m4a".to_string(),
            emit_artifact: true,
            lose_artifact: false,
            fail_prepare: false,
            prepared: false,
            segments: 0,
        }
    }

    /// Delay every native call, like a real device's async prepare
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Stop returns no artifact location
    pub fn without_artifact(mut self) -> Self {
        self.emit_artifact = false;
        self
    }

    /// Stop reports a file location that was never written
    pub fn with_missing_artifact(mut self) -> Self {
        self.lose_artifact = true;
        self
    }

    /// Prepare fails, as when the input device is busy
    pub fn failing_prepare(mut self) -> Self {
        self.fail_prepare = true;
        self
    }

    async fn settle(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl AudioRecorder for SimulatedRecorder {
    async fn prepare(&mut self, options: &RecordingOptions) -> DeviceResult<()> {
        self.log.push(DeviceCall::Prepare);
        self.settle().await;
        if self.fail_prepare {
            return Err(DeviceError("audio input busy".to_string()));
        }
        self.extension = options.extension.clone();
        self.prepared = true;
        self.segments = 0;
        Ok(())
    }

    async fn start(&mut self) -> DeviceResult<()> {
        self.log.push(DeviceCall::Start);
        if !self.prepared {
            return Err(DeviceError("recorder not prepared".to_string()));
        }
        self.segments += 1;
        Ok(())
    }

    async fn pause(&mut self) -> DeviceResult<()> {
        self.log.push(DeviceCall::Pause);
        Ok(())
    }

    async fn resume(&mut self) -> DeviceResult<()> {
        self.log.push(DeviceCall::Resume);
        self.segments += 1;
        Ok(())
    }

    async fn stop(&mut self) -> DeviceResult<Option<Artifact>> {
        self.log.push(DeviceCall::Stop);
        self.settle().await;
        self.prepared = false;

        if !self.emit_artifact {
            return Ok(None);
        }

        let path = self
            .output_dir
            .join(format!("recording-{}.{}", uuid::Uuid::new_v4(), self.extension));
        if self.lose_artifact {
            return Ok(Some(file_uri(&path)));
        }

        tokio::fs::write(&path, render_audio(self.segments))
            .await
            .map_err(|e| DeviceError(format!("Failed to write {:?}: {}", path, e)))?;

        Ok(Some(file_uri(&path)))
    }
}

/// Camera that writes a tiny JPEG per capture
pub struct SimulatedCamera {
    output_dir: PathBuf,
    log: DeviceLog,
    emit_artifact: bool,
    open: bool,
}

impl SimulatedCamera {
    pub fn new(output_dir: &Path, log: DeviceLog) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            log,
            emit_artifact: true,
            open: false,
        }
    }

    /// Captures return no artifact location
    pub fn without_artifact(mut self) -> Self {
        self.emit_artifact = false;
        self
    }
}

#[async_trait]
impl CameraDevice for SimulatedCamera {
    async fn open(&mut self) -> DeviceResult<()> {
        self.log.push(DeviceCall::CameraOpen);
        self.open = true;
        Ok(())
    }

    async fn capture(&mut self, options: CaptureOptions) -> DeviceResult<Option<Artifact>> {
        self.log.push(DeviceCall::Capture {
            quality: options.quality,
        });
        if !self.open {
            return Err(DeviceError("camera preview not open".to_string()));
        }
        if !self.emit_artifact {
            return Ok(None);
        }

        let path = self
            .output_dir
            .join(format!("photo-{}.jpg", uuid::Uuid::new_v4()));
        let mut bytes = JPEG_HEADER.to_vec();
        bytes.extend_from_slice(b"JFIF\x00");
        bytes.extend_from_slice(b"\xff\xd9");
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| DeviceError(format!("Failed to write {:?}: {}", path, e)))?;

        Ok(Some(Artifact::from_path(&path)))
    }

    async fn close(&mut self) -> DeviceResult<()> {
        self.log.push(DeviceCall::CameraClose);
        self.open = false;
        Ok(())
    }
}
