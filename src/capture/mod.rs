//! Device capture seams
//!
//! Permission gate and native recorder/camera traits, plus the simulated
//! backend used by the headless host.

pub mod permissions;
pub mod simulated;
pub mod traits;

pub use permissions::ensure_granted;
pub use traits::{
    Artifact, AudioRecorder, CameraDevice, Capability, CaptureOptions, DeviceError, DeviceResult,
    PermissionGate, PermissionStatus, RecordingOptions,
};
