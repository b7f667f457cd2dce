//! Inbound dispatch
//!
//! Parses web content messages and hands them to the owning controller.
//! Each capability runs on its own task with an ordered command queue, so
//! audio and camera work overlap while each controller sees its requests
//! one at a time, in arrival order.

use super::outbox::{MessageSink, Outbox};
use super::protocol::{InboundRequest, OutboundEvent, RequestKind};
use crate::camera::CameraController;
use crate::capture::{AudioRecorder, CameraDevice, PermissionGate};
use crate::config::BridgeConfig;
use crate::recorder::AudioController;
use crate::utils::{BridgeError, ErrorResponse};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Native backends the bridge drives
pub struct Devices {
    pub permissions: Arc<dyn PermissionGate>,
    pub recorder: Box<dyn AudioRecorder>,
    pub camera: Box<dyn CameraDevice>,
}

/// Request queued for a controller task
#[derive(Debug, Clone)]
struct Command {
    kind: RequestKind,
    id: Option<String>,
}

/// Running bridge
pub struct Bridge {
    audio_tx: mpsc::UnboundedSender<Command>,
    camera_tx: mpsc::UnboundedSender<Command>,
    tasks: Vec<JoinHandle<()>>,
}

impl Bridge {
    /// Spawn the controller tasks on the current runtime
    pub fn spawn(devices: Devices, sink: Arc<dyn MessageSink>, config: BridgeConfig) -> Self {
        let outbox = Outbox::new(sink);

        let audio = AudioController::new(
            devices.recorder,
            devices.permissions.clone(),
            config.recording.clone(),
            outbox.clone(),
        );
        let camera = CameraController::new(
            devices.camera,
            devices.permissions,
            outbox.clone(),
            config.photo_payload,
            config.close_camera_after_capture,
        );

        let (audio_tx, audio_rx) = mpsc::unbounded_channel();
        let (camera_tx, camera_rx) = mpsc::unbounded_channel();
        let report = config.report_failures;

        let tasks = vec![
            tokio::spawn(run_audio(audio, audio_rx, outbox.clone(), report)),
            tokio::spawn(run_camera(camera, camera_rx, outbox, report)),
        ];

        tracing::info!("Bridge started (report_failures={})", report);
        Self {
            audio_tx,
            camera_tx,
            tasks,
        }
    }

    /// Handle one text message from the web content
    ///
    /// Malformed messages and unknown kinds are dropped, never answered.
    pub fn handle_message(&self, text: &str) {
        match InboundRequest::parse(text) {
            Ok(request) => self.dispatch(request),
            Err(e) => tracing::warn!("Ignoring malformed message ({}): {}", e, truncate(text)),
        }
    }

    /// Route a parsed request to its controller
    pub fn dispatch(&self, request: InboundRequest) {
        tracing::debug!("<- {} (id={:?})", request.kind.as_str(), request.id);

        let queue = match request.kind {
            RequestKind::StartRecord
            | RequestKind::StopRecord
            | RequestKind::PauseRecord
            | RequestKind::ResumeRecord => &self.audio_tx,
            RequestKind::OpenCamera | RequestKind::TakePhoto | RequestKind::CloseCamera => {
                &self.camera_tx
            }
            RequestKind::Unknown => {
                tracing::debug!("Ignoring unknown request kind");
                return;
            }
        };

        let command = Command {
            kind: request.kind,
            id: request.id,
        };
        if queue.send(command).is_err() {
            tracing::error!("Controller task is gone, dropping {}", request.kind.as_str());
        }
    }

    /// Stop accepting requests and wait for queued work to finish
    pub async fn shutdown(self) {
        let Bridge {
            audio_tx,
            camera_tx,
            tasks,
        } = self;
        drop(audio_tx);
        drop(camera_tx);

        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!("Controller task failed: {}", e);
            }
        }
        tracing::info!("Bridge stopped");
    }
}

async fn run_audio(
    mut controller: AudioController,
    mut queue: mpsc::UnboundedReceiver<Command>,
    outbox: Outbox,
    report: bool,
) {
    while let Some(command) = queue.recv().await {
        let id = command.id.clone();
        let result = match command.kind {
            RequestKind::StartRecord => controller.start(id).await,
            RequestKind::StopRecord => controller.stop(id).await,
            RequestKind::PauseRecord => controller.pause(id).await,
            RequestKind::ResumeRecord => controller.resume(id).await,
            other => {
                tracing::error!("Audio controller got {}", other.as_str());
                continue;
            }
        };
        if let Err(error) = result {
            handle_failure(&outbox, report, &command, &error);
        }
    }
}

async fn run_camera(
    mut controller: CameraController,
    mut queue: mpsc::UnboundedReceiver<Command>,
    outbox: Outbox,
    report: bool,
) {
    while let Some(command) = queue.recv().await {
        let result = match command.kind {
            RequestKind::OpenCamera => controller.open().await,
            RequestKind::TakePhoto => controller.capture(command.id.clone()).await,
            RequestKind::CloseCamera => controller.close().await,
            other => {
                tracing::error!("Camera controller got {}", other.as_str());
                continue;
            }
        };
        if let Err(error) = result {
            handle_failure(&outbox, report, &command, &error);
        }
    }
}

/// Log a controller failure and, when enabled, tell the web content
fn handle_failure(outbox: &Outbox, report: bool, command: &Command, error: &BridgeError) {
    let request = command.kind.as_str();
    match error {
        BridgeError::InvalidStateTransition { .. } => {
            tracing::debug!("Ignored {}: {}", request, error);
        }
        BridgeError::PermissionDenied(_) => {
            tracing::info!("{} not performed: {}", request, error);
        }
        _ => {
            tracing::warn!("{} failed: {}", request, error);
        }
    }

    if report && error.is_reportable() {
        outbox.emit(OutboundEvent::failure(
            command.id.clone(),
            ErrorResponse::new(request, error),
        ));
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(120) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::simulated::{
        render_audio, DeviceCall, DeviceLog, SimulatedCamera, SimulatedPermissions,
        SimulatedRecorder,
    };
    use crate::capture::{Capability, PermissionStatus};
    use crate::config::PhotoPayloadShape;
    use base64::engine::general_purpose;
    use base64::Engine;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        bridge: Bridge,
        events: mpsc::UnboundedReceiver<String>,
        log: DeviceLog,
        dir: TempDir,
    }

    fn fixture_with(
        permissions: SimulatedPermissions,
        config: BridgeConfig,
        build: impl FnOnce(SimulatedRecorder) -> SimulatedRecorder,
    ) -> Fixture {
        fixture_in(".", permissions, config, build)
    }

    /// Devices write into `subdir` of a fresh temp dir
    fn fixture_in(
        subdir: &str,
        permissions: SimulatedPermissions,
        config: BridgeConfig,
        build: impl FnOnce(SimulatedRecorder) -> SimulatedRecorder,
    ) -> Fixture {
        let dir = tempdir().unwrap();
        let artifact_dir = dir.path().join(subdir);
        std::fs::create_dir_all(&artifact_dir).unwrap();
        let log = DeviceLog::new();
        let devices = Devices {
            permissions: Arc::new(permissions),
            recorder: Box::new(build(SimulatedRecorder::new(&artifact_dir, log.clone()))),
            camera: Box::new(SimulatedCamera::new(&artifact_dir, log.clone())),
        };
        let (tx, events) = mpsc::unbounded_channel();
        let bridge = Bridge::spawn(devices, Arc::new(tx), config);
        Fixture {
            bridge,
            events,
            log,
            dir,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(SimulatedPermissions::granted(), BridgeConfig::default(), |r| r)
    }

    async fn next_event(f: &mut Fixture) -> serde_json::Value {
        let text = tokio::time::timeout(Duration::from_secs(5), f.events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed");
        serde_json::from_str(&text).unwrap()
    }

    /// Shut the bridge down and collect everything it still emitted
    async fn drain(f: Fixture) -> (Vec<serde_json::Value>, DeviceLog, TempDir) {
        let Fixture {
            bridge,
            mut events,
            log,
            dir,
        } = f;
        bridge.shutdown().await;
        let mut remaining = Vec::new();
        while let Ok(text) = events.try_recv() {
            remaining.push(serde_json::from_str(&text).unwrap());
        }
        (remaining, log, dir)
    }

    #[tokio::test]
    async fn test_record_scenario() {
        let mut f = fixture();

        f.bridge.handle_message(r#"{"type":"start-record"}"#);
        assert_eq!(next_event(&mut f).await, serde_json::json!({"type": "onStartRecord"}));

        f.bridge.handle_message(r#"{"type":"stop-record"}"#);
        let event = next_event(&mut f).await;
        assert_eq!(event["type"], "onStopRecord");
        assert_eq!(event["data"]["ext"], "m4a");
        assert_eq!(event["data"]["mimeType"], "audio/mp4");
        assert!(event.get("id").is_none());

        // Delivered bytes match what was recorded, and the file is gone
        let audio = general_purpose::STANDARD
            .decode(event["data"]["audio"].as_str().unwrap())
            .unwrap();
        assert_eq!(audio, render_audio(1));
        assert_eq!(std::fs::read_dir(f.dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_numeric_id_still_starts_recording() {
        let mut f = fixture();

        f.bridge.handle_message(r#"{"type":"start-record","id":1}"#);
        let event = next_event(&mut f).await;
        assert_eq!(event, serde_json::json!({"type": "onStartRecord", "id": "1"}));

        f.bridge.handle_message(r#"{"type":"stop-record","id":[1]}"#);
        let event = next_event(&mut f).await;
        assert_eq!(event["type"], "onStopRecord");
        assert!(event.get("id").is_none());
    }

    #[tokio::test]
    async fn test_artifact_dir_with_reserved_characters() {
        let mut f = fixture_in(
            "rec%20ordings #1",
            SimulatedPermissions::granted(),
            BridgeConfig::default(),
            |r| r,
        );

        f.bridge.handle_message(r#"{"type":"start-record"}"#);
        f.bridge.handle_message(r#"{"type":"pause-record"}"#);
        f.bridge.handle_message(r#"{"type":"resume-record"}"#);
        f.bridge.handle_message(r#"{"type":"stop-record"}"#);

        for expected in ["onStartRecord", "onPauseRecord", "onResumeRecord"] {
            assert_eq!(next_event(&mut f).await["type"], expected);
        }
        let event = next_event(&mut f).await;
        assert_eq!(event["type"], "onStopRecord");
        let audio = general_purpose::STANDARD
            .decode(event["data"]["audio"].as_str().unwrap())
            .unwrap();
        assert_eq!(audio, render_audio(2));
    }

    #[tokio::test]
    async fn test_stop_right_after_slow_start_still_delivers() {
        let mut f = fixture_with(SimulatedPermissions::granted(), BridgeConfig::default(), |r| {
            r.with_latency(Duration::from_millis(30))
        });

        f.bridge.handle_message(r#"{"type":"start-record","id":"a"}"#);
        f.bridge.handle_message(r#"{"type":"stop-record","id":"b"}"#);

        let started = next_event(&mut f).await;
        assert_eq!(started["type"], "onStartRecord");
        assert_eq!(started["id"], "a");
        let stopped = next_event(&mut f).await;
        assert_eq!(stopped["type"], "onStopRecord");
        assert_eq!(stopped["id"], "b");
    }

    #[tokio::test]
    async fn test_pause_while_idle_emits_nothing() {
        let f = fixture();
        f.bridge.handle_message(r#"{"type":"pause-record"}"#);
        f.bridge.handle_message(r#"{"type":"resume-record"}"#);
        f.bridge.handle_message(r#"{"type":"stop-record"}"#);

        let (events, log, _dir) = drain(f).await;
        assert!(events.is_empty());
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn test_open_camera_denied_emits_nothing() {
        let permissions = SimulatedPermissions::granted();
        permissions.set(Capability::Camera, PermissionStatus::Denied);
        let f = fixture_with(permissions, BridgeConfig::default(), |r| r);

        f.bridge.handle_message(r#"{"type":"open-camera"}"#);
        f.bridge.handle_message(r#"{"type":"take-photo"}"#);

        let (events, log, _dir) = drain(f).await;
        assert!(events.is_empty());
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn test_camera_scenario() {
        let mut f = fixture();

        f.bridge.handle_message(r#"{"type":"open-camera"}"#);
        f.bridge.handle_message(r#"{"type":"take-photo","id":"p"}"#);

        let event = next_event(&mut f).await;
        assert_eq!(event["type"], "onTakePhoto");
        assert_eq!(event["id"], "p");
        assert!(event["data"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));

        let (events, log, _dir) = drain(f).await;
        assert!(events.is_empty());
        assert_eq!(log.count(&DeviceCall::CameraClose), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_messages_are_ignored() {
        let f = fixture();
        f.bridge.handle_message(r#"{"type":"launch-rocket"}"#);
        f.bridge.handle_message("not json");
        f.bridge.handle_message(r#"{"id":"x"}"#);
        f.bridge.handle_message(r#"{"type":"close-camera"}"#);

        let (events, log, _dir) = drain(f).await;
        assert!(events.is_empty());
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_artifact_reports_error() {
        let mut f = fixture_with(SimulatedPermissions::granted(), BridgeConfig::default(), |r| {
            r.without_artifact()
        });

        f.bridge.handle_message(r#"{"type":"start-record"}"#);
        f.bridge.handle_message(r#"{"type":"stop-record","id":"9"}"#);

        assert_eq!(next_event(&mut f).await["type"], "onStartRecord");
        let event = next_event(&mut f).await;
        assert_eq!(
            event,
            serde_json::json!({
                "type": "onError",
                "id": "9",
                "data": {
                    "request": "stop-record",
                    "code": "ARTIFACT_UNAVAILABLE",
                    "message": "Artifact unavailable: recorder returned no file location"
                }
            })
        );
    }

    #[tokio::test]
    async fn test_missing_artifact_silent_when_not_reporting() {
        let config = BridgeConfig {
            report_failures: false,
            ..BridgeConfig::default()
        };
        let mut f = fixture_with(SimulatedPermissions::granted(), config, |r| r.without_artifact());

        f.bridge.handle_message(r#"{"type":"start-record"}"#);
        f.bridge.handle_message(r#"{"type":"stop-record"}"#);
        assert_eq!(next_event(&mut f).await["type"], "onStartRecord");

        let (events, _log, _dir) = drain(f).await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_recording_reports_encoding_failure() {
        let mut f = fixture_with(SimulatedPermissions::granted(), BridgeConfig::default(), |r| {
            r.with_missing_artifact()
        });

        f.bridge.handle_message(r#"{"type":"start-record"}"#);
        f.bridge.handle_message(r#"{"type":"stop-record","id":"e"}"#);

        assert_eq!(next_event(&mut f).await["type"], "onStartRecord");
        let event = next_event(&mut f).await;
        assert_eq!(event["type"], "onError");
        assert_eq!(event["id"], "e");
        assert_eq!(event["data"]["request"], "stop-record");
        assert_eq!(event["data"]["code"], "ENCODING_FAILED");

        // Back to idle: a new recording starts
        f.bridge.handle_message(r#"{"type":"start-record"}"#);
        assert_eq!(next_event(&mut f).await["type"], "onStartRecord");
    }

    #[tokio::test]
    async fn test_unreadable_recording_silent_when_not_reporting() {
        let config = BridgeConfig {
            report_failures: false,
            ..BridgeConfig::default()
        };
        let mut f = fixture_with(SimulatedPermissions::granted(), config, |r| {
            r.with_missing_artifact()
        });

        f.bridge.handle_message(r#"{"type":"start-record"}"#);
        f.bridge.handle_message(r#"{"type":"stop-record"}"#);
        assert_eq!(next_event(&mut f).await["type"], "onStartRecord");

        f.bridge.handle_message(r#"{"type":"start-record"}"#);
        assert_eq!(next_event(&mut f).await["type"], "onStartRecord");

        let (events, log, _dir) = drain(f).await;
        assert!(events.is_empty());
        assert_eq!(log.count(&DeviceCall::Prepare), 2);
    }

    #[tokio::test]
    async fn test_envelope_photo_payload() {
        let config = BridgeConfig {
            photo_payload: PhotoPayloadShape::Envelope,
            ..BridgeConfig::default()
        };
        let mut f = fixture_with(SimulatedPermissions::granted(), config, |r| r);

        f.bridge.handle_message(r#"{"type":"open-camera"}"#);
        f.bridge.handle_message(r#"{"type":"take-photo"}"#);

        let event = next_event(&mut f).await;
        assert_eq!(event["data"]["mimeType"], "image/jpeg");
        assert_eq!(event["data"]["ext"], "jpg");
    }

    /// Replays the device log and fails on any call made from a state
    /// where it is not valid
    fn assert_valid_device_sequence(calls: &[DeviceCall]) {
        enum Device {
            Idle,
            Prepared,
            Recording,
            Paused,
        }
        let mut state = Device::Idle;
        for call in calls {
            let next = match (call, &state) {
                (DeviceCall::Prepare, Device::Idle) => Device::Prepared,
                (DeviceCall::Start, Device::Prepared) => Device::Recording,
                (DeviceCall::Pause, Device::Recording) => Device::Paused,
                (DeviceCall::Resume, Device::Paused) => Device::Recording,
                (DeviceCall::Stop, Device::Recording | Device::Paused) => Device::Idle,
                (DeviceCall::CameraOpen, _)
                | (DeviceCall::Capture { .. }, _)
                | (DeviceCall::CameraClose, _) => continue,
                (call, _) => panic!("invalid device call {:?} in {:?}", call, calls),
            };
            state = next;
        }
    }

    #[tokio::test]
    async fn test_message_bursts_never_break_guards() {
        let kinds = [
            "start-record",
            "stop-record",
            "pause-record",
            "resume-record",
            "open-camera",
            "take-photo",
            "close-camera",
        ];
        let f = fixture();

        // Deterministic pseudo-random burst
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..300 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let kind = kinds[(seed >> 16) as usize % kinds.len()];
            f.bridge.handle_message(&format!(r#"{{"type":"{kind}"}}"#));
        }

        let (events, log, _dir) = drain(f).await;
        assert_valid_device_sequence(&log.calls());

        let starts = events.iter().filter(|e| e["type"] == "onStartRecord").count();
        let stops = events.iter().filter(|e| e["type"] == "onStopRecord").count();
        assert!(stops <= starts && starts <= stops + 1);
        assert!(events.iter().all(|e| e["type"] != "onError"));
    }
}
