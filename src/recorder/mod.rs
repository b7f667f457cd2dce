//! Audio recording module
//!
//! - RecordingState machine and RecordingSession tracking
//! - AudioController driving the native recorder

pub mod controller;
pub mod state;

pub use controller::AudioController;
pub use state::{RecordingSession, RecordingState};
