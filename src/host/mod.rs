//! Headless host
//!
//! Wires configuration, simulated devices and the bridge to a stdio
//! message channel.

pub mod stdio;

use crate::bridge::{Bridge, Devices};
use crate::capture::simulated::{
    DeviceLog, SimulatedCamera, SimulatedPermissions, SimulatedRecorder,
};
use crate::capture::PermissionStatus;
use crate::config::HostConfig;
use anyhow::Context;
use std::sync::Arc;
use tokio::io::BufReader;

/// Run the bridge over stdin/stdout until stdin closes
pub async fn run(config: HostConfig) -> anyhow::Result<()> {
    let artifact_dir = config.artifact_dir();
    std::fs::create_dir_all(&artifact_dir)
        .with_context(|| format!("Failed to create artifact dir {:?}", artifact_dir))?;

    tracing::info!(
        "Hosting web content from {} ({:?})",
        config.content_url(),
        config.platform
    );
    tracing::info!("Simulated devices write to {:?}", artifact_dir);

    let log = DeviceLog::new();
    let devices = Devices {
        permissions: Arc::new(SimulatedPermissions::prompting(PermissionStatus::Granted)),
        recorder: Box::new(SimulatedRecorder::new(&artifact_dir, log.clone())),
        camera: Box::new(SimulatedCamera::new(&artifact_dir, log.clone())),
    };

    let bridge = Bridge::spawn(devices, Arc::new(stdio::StdoutSink), config.bridge);

    let handled = stdio::pump_lines(BufReader::new(tokio::io::stdin()), &bridge)
        .await
        .context("Failed to read from stdin")?;

    bridge.shutdown().await;
    tracing::info!(
        "Handled {} message(s), {} device call(s)",
        handled,
        log.calls().len()
    );
    Ok(())
}
