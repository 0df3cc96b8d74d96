//! The ingestion loop.
//!
//! Waits for the instrument's input files, then repeatedly runs the
//! analysis process and folds each batch into the history table:
//! INVOKE → READ_OUTPUT → TRANSFORM → MERGE → PERSIST, then sleep.
//! No failure inside an iteration may take the service down.

use std::fs;
use std::time::Duration;

use chrono::{DateTime, Local};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::ServiceConfig;
use crate::error::IterationError;
use crate::history::HistoryTable;
use crate::invoker::AnalysisRunner;
use crate::readiness::inputs_ready;
use crate::transform::{parse_batch_csv, pivot_wide};

const READINESS_POLL_SECS: u64 = 10;

/// What a completed iteration did.
#[derive(Debug, PartialEq, Eq)]
pub enum IterationOutcome {
    /// New rows merged and the history persisted.
    Merged { new_rows: usize, total_rows: usize },
    /// The analysis produced an empty batch; nothing merged.
    EmptyBatch,
}

/// Run the service until cancelled.
///
/// Blocks (cancellably) until both input categories are present, loads
/// the persisted history once, then iterates forever. Every iteration
/// ends with the configured wait, success or failure, so an analysis
/// failure gets its cooldown for free.
pub async fn ingest_loop<R: AnalysisRunner>(
    config: ServiceConfig,
    runner: R,
    cancel_token: CancellationToken,
) {
    info!("=== Bioaerosol ingestion service started ===");
    info!("Watching directory: {}", config.input_dir.display());

    while !inputs_ready(&config.input_dir) {
        info!(
            "Waiting for AQ and FT files in {}...",
            config.input_dir.display()
        );
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(READINESS_POLL_SECS)) => {}
            _ = cancel_token.cancelled() => {
                info!("ingestion loop shutting down");
                return;
            }
        }
    }

    info!("Input files detected. Starting ingestion loop...");

    let mut table = HistoryTable::load(&config.history_path);
    let wait = Duration::from_secs(config.wait_secs.max(1));
    let mut loop_count: u64 = 0;

    loop {
        let batch_name = batch_name(&config.batch_prefix, Local::now());
        info!("--- Loop {loop_count} start: batch {batch_name} ---");

        match run_iteration(&config, &runner, &mut table, &batch_name).await {
            Ok(IterationOutcome::Merged {
                new_rows,
                total_rows,
            }) => info!("Success! Added {new_rows} new timestamps. Total records: {total_rows}"),
            Ok(IterationOutcome::EmptyBatch) => {
                info!("Analysis produced an empty batch; nothing to merge")
            }
            Err(IterationError::OutputMissing { path }) => {
                warn!("Expected output file not found: {}", path.display())
            }
            Err(err) => error!("Iteration failed: {err}"),
        }

        loop_count += 1;
        info!("Sleeping for {} seconds...", wait.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = cancel_token.cancelled() => {
                info!("ingestion loop shutting down");
                break;
            }
        }
    }
}

/// One INVOKE → READ_OUTPUT → TRANSFORM → MERGE → PERSIST pass.
///
/// The runner resolves only after the analysis process has exited, so
/// process exit is the completion signal for the batch file; there is no
/// window where a half-written output gets read.
pub async fn run_iteration<R: AnalysisRunner>(
    config: &ServiceConfig,
    runner: &R,
    table: &mut HistoryTable,
    batch_name: &str,
) -> Result<IterationOutcome, IterationError> {
    runner
        .run(
            &config.input_dir,
            &config.staging_dir,
            batch_name,
            &config.interval_unit,
        )
        .await?;

    let output_path = config.staging_dir.join(format!("{batch_name}.csv"));
    if !output_path.exists() {
        return Err(IterationError::OutputMissing { path: output_path });
    }

    let contents =
        fs::read_to_string(&output_path).map_err(|err| IterationError::MalformedBatch {
            path: output_path.clone(),
            detail: format!("unreadable output file: {err}"),
        })?;

    let observations = parse_batch_csv(&output_path, &contents)?;

    let outcome = if observations.is_empty() {
        IterationOutcome::EmptyBatch
    } else {
        let rows = pivot_wide(observations);
        if rows.is_empty() {
            IterationOutcome::EmptyBatch
        } else {
            let new_rows = table.merge(rows);
            table.cap(config.max_history_rows);
            table
                .save_atomic(&config.history_path)
                .map_err(IterationError::Persist)?;
            IterationOutcome::Merged {
                new_rows,
                total_rows: table.len(),
            }
        }
    };

    // The staged batch has been consumed; leaving it behind would let
    // the staging directory grow without bound.
    if let Err(err) = fs::remove_file(&output_path) {
        warn!(
            "Could not remove consumed batch {}: {err}",
            output_path.display()
        );
    }

    Ok(outcome)
}

/// `<prefix>_<YYYYmmdd_HHMMSS>`. Second resolution keeps consecutive
/// iterations distinguishable.
fn batch_name(prefix: &str, now: DateTime<Local>) -> String {
    format!("{}_{}", prefix, now.format("%Y%m%d_%H%M%S"))
}
