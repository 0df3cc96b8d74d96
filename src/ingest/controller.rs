use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ServiceConfig;
use crate::invoker::AnalysisRunner;

use super::loop_worker::ingest_loop;

/// Owns the ingestion loop task: one running loop at a time, stoppable
/// via cancellation.
pub struct IngestController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl IngestController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start<R: AnalysisRunner>(&mut self, config: ServiceConfig, runner: R) -> Result<()> {
        if self.handle.is_some() {
            bail!("ingestion already active");
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(ingest_loop(config, runner, token_clone));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("ingestion loop task failed to join")?;
            info!("Ingestion loop stopped");
        }
        Ok(())
    }
}

impl Default for IngestController {
    fn default() -> Self {
        Self::new()
    }
}
