use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Runtime configuration for the ingestion service.
///
/// Loaded once at startup and handed to the loop by value; there is no
/// process-wide mutable configuration state, so tests can run several
/// independent instances side by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory watched for instrument input files.
    pub input_dir: PathBuf,
    /// Staging directory the analysis process writes batch CSVs into.
    pub staging_dir: PathBuf,
    /// Canonical history artifact shared with the dashboard.
    pub history_path: PathBuf,
    /// Interpreter executable for the analysis script (e.g. Rscript).
    pub executable: PathBuf,
    /// Analysis script passed as the interpreter's first argument.
    pub script: PathBuf,
    /// Time granularity forwarded to the analysis process (`-t`).
    pub interval_unit: String,
    /// Base name prefix for per-batch output files (`-f`).
    pub batch_prefix: String,
    /// Seconds to wait at the end of every iteration, success or failure.
    pub wait_secs: u64,
    /// Maximum rows retained in the history table; oldest evicted first.
    pub max_history_rows: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("InstaScope_data"),
            staging_dir: PathBuf::from("temp_r_output"),
            history_path: PathBuf::from("automated_results.csv"),
            executable: PathBuf::from("Rscript"),
            script: PathBuf::from("bioaerosol_script.R"),
            interval_unit: "mins".into(),
            batch_prefix: "batch_process".into(),
            wait_secs: 60,
            max_history_rows: 5000,
        }
    }
}

impl ServiceConfig {
    /// Read configuration from a JSON file. A missing file yields the
    /// defaults; a present but unparseable file is a startup error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Make sure the staging directory exists before the first analysis
    /// run. The input directory is the instrument's to create; its
    /// absence only gets a warning here because the readiness gate keeps
    /// polling for it anyway.
    pub fn prepare_directories(&self) -> Result<()> {
        if !self.input_dir.exists() {
            warn!(
                "Input directory {} does not exist yet",
                self.input_dir.display()
            );
        }

        fs::create_dir_all(&self.staging_dir).with_context(|| {
            format!(
                "failed to create staging directory {}",
                self.staging_dir.display()
            )
        })
    }
}
