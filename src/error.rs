//! Error taxonomy for the ingestion loop.
//!
//! Every variant here is confined to a single loop iteration: the loop
//! logs it and moves on to the next tick. Only startup wiring and the
//! final join path use `anyhow` and may abort the process.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to launch or complete the external analysis process.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("failed to launch analysis process {executable}: {source}")]
    Spawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Non-zero exit. `code` is -1 when the child was killed by a signal.
    #[error("analysis process exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Anything that can end an ingestion iteration early.
#[derive(Debug, Error)]
pub enum IterationError {
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    /// The analysis process exited cleanly but its output file is absent.
    #[error("expected analysis output not found: {path}")]
    OutputMissing { path: PathBuf },

    /// Output file present but unreadable or missing required columns.
    #[error("analysis output {path} is malformed: {detail}")]
    MalformedBatch { path: PathBuf, detail: String },

    /// The merged history could not be written back to disk.
    #[error("failed to persist history: {0}")]
    Persist(#[source] anyhow::Error),
}
