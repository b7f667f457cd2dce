use capture_bridge::config::HostConfig;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    capture_bridge::init_tracing();
    tracing::info!("Starting Capture Bridge v{}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = HostConfig::load(config_path.as_deref())?;

    capture_bridge::host::run(config).await
}
