//! External analysis process invocation.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::info;
use tokio::process::Command;

use crate::error::InvokeError;

/// Seam between the ingestion loop and the external analysis executable.
///
/// The loop only ever sees this trait, so tests substitute a canned
/// runner and never spawn a real process.
pub trait AnalysisRunner: Send + Sync + 'static {
    /// Run one analysis pass over `input_dir`, writing
    /// `<output_dir>/<batch_name>.csv`. Resolves only once the child
    /// process has exited; success means exit code zero.
    fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        batch_name: &str,
        interval_unit: &str,
    ) -> impl Future<Output = Result<(), InvokeError>> + Send;
}

/// Invokes the analysis script through its interpreter with the fixed
/// `-i -o -f -t` argument contract.
#[derive(Debug, Clone)]
pub struct RscriptRunner {
    executable: PathBuf,
    script: PathBuf,
}

impl RscriptRunner {
    pub fn new(executable: PathBuf, script: PathBuf) -> Self {
        Self { executable, script }
    }

    fn command(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        batch_name: &str,
        interval_unit: &str,
    ) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(&self.script)
            .arg("-i")
            .arg(input_dir)
            .arg("-o")
            .arg(output_dir)
            .arg("-f")
            .arg(batch_name)
            .arg("-t")
            .arg(interval_unit)
            .stdin(Stdio::null());
        cmd
    }
}

impl AnalysisRunner for RscriptRunner {
    async fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        batch_name: &str,
        interval_unit: &str,
    ) -> Result<(), InvokeError> {
        info!("Running analysis script for batch {batch_name}...");

        let output = self
            .command(input_dir, output_dir, batch_name, interval_unit)
            .output()
            .await
            .map_err(|source| InvokeError::Spawn {
                executable: self.executable.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(InvokeError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_follows_the_argument_contract() {
        let runner = RscriptRunner::new(
            PathBuf::from("/usr/local/bin/Rscript"),
            PathBuf::from("bioaerosol_script.R"),
        );
        let cmd = runner.command(Path::new("/data/in"), Path::new("/data/out"), "batch_x", "mins");

        let std_cmd = cmd.as_std();
        assert_eq!(std_cmd.get_program(), "/usr/local/bin/Rscript");

        let args: Vec<String> = std_cmd
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "bioaerosol_script.R",
                "-i",
                "/data/in",
                "-o",
                "/data/out",
                "-f",
                "batch_x",
                "-t",
                "mins",
            ]
        );
    }
}
