//! Capture Bridge - device capture for embedded web content.
//!
//! The web page never touches device APIs. It posts requests by name over a
//! text channel and receives results asynchronously as events. This crate
//! provides that bridge, the recorder and camera state machines behind it,
//! and the encoder that turns captured files into base64 payloads.

pub mod bridge;
pub mod camera;
pub mod capture;
pub mod config;
pub mod encoder;
pub mod host;
pub mod recorder;
pub mod utils;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
///
/// Logs go to stderr; stdout may be the message channel itself.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "capture_bridge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
