//! DeployHook remote execution adapter.
//!
//! Implements [`deploy::RemoteExecutor`] by shelling out to `knife ssh`, which
//! resolves the node search query, opens the SSH session, and runs the command:
//!
//! ```text
//! knife ssh '<query>' '<command>'
//! ```
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Process spawning and output capture live here. The
//! [`deploy`] crate sees only [`deploy::RemoteExecutor`].

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use deploy::{CommandSpec, ExecutionResult, ExecutorError, RemoteExecutor, TargetHost, Timestamp};
use tokio::process::Command;
use tracing::debug;

/// Runs remote commands through a local `knife` binary.
#[derive(Debug, Clone)]
pub struct KnifeSshExecutor {
    program: PathBuf,
}

impl KnifeSshExecutor {
    /// Creates an executor that invokes `program` (usually `knife`, resolved
    /// through `PATH`).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The program this executor runs.
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }
}

impl Default for KnifeSshExecutor {
    fn default() -> Self {
        Self::new("knife")
    }
}

#[async_trait]
impl RemoteExecutor for KnifeSshExecutor {
    async fn run_remote(&self, host: &TargetHost, spec: &CommandSpec) -> Result<ExecutionResult, ExecutorError> {
        debug!(program = %self.program.display(), query = %spec.query, "spawning knife ssh");

        let started_at = Timestamp::now();
        let output = Command::new(&self.program)
            .arg("ssh")
            .arg(&spec.query)
            .arg(&spec.command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ExecutorError::Spawn {
                program: self.program.display().to_string(),
                message: e.to_string(),
            })?;
        let finished_at = Timestamp::now();

        Ok(ExecutionResult {
            host: host.clone(),
            // `None` means the process was killed by a signal.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            started_at,
            finished_at,
        })
    }
}
