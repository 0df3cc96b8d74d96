use std::path::PathBuf;

use anyhow::Result;
use log::info;

use aeroscope::config::ServiceConfig;
use aeroscope::ingest::IngestController;
use aeroscope::invoker::RscriptRunner;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("aeroscope.json"));
    let config = ServiceConfig::load(&config_path)?;
    config.prepare_directories()?;

    let runner = RscriptRunner::new(config.executable.clone(), config.script.clone());

    let mut controller = IngestController::new();
    controller.start(config, runner)?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    controller.stop().await?;

    Ok(())
}
