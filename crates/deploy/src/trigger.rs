//! Deployment trigger: kick configuration management on the target host.

use tracing::{error, info};

use crate::{ExecutionResult, RemoteCommand, RemoteExecutor, TargetHost, TriggerError};

/// Issues the remote configuration-management run for a host.
///
/// Exactly one attempt is made. Timeouts, if any, belong to the executor.
pub struct DeploymentTrigger<'a, E: RemoteExecutor + ?Sized> {
    executor: &'a E,
    command: &'a RemoteCommand,
}

impl<'a, E: RemoteExecutor + ?Sized> DeploymentTrigger<'a, E> {
    /// Creates a trigger that runs `command` through `executor`.
    pub fn new(executor: &'a E, command: &'a RemoteCommand) -> Self {
        Self { executor, command }
    }

    /// Runs the command on `host` and waits for the result.
    ///
    /// # Errors
    ///
    /// - [`TriggerError::Executor`] if the command could not be run.
    /// - [`TriggerError::ExecutionFailed`] if it exited non-zero.
    pub async fn trigger(&self, host: &TargetHost) -> Result<ExecutionResult, TriggerError> {
        let spec = self.command.render(host);
        info!(%host, query = %spec.query, "starting remote configuration run");

        let result = self
            .executor
            .run_remote(host, &spec)
            .await
            .inspect_err(|e| error!(%host, error = %e, "remote configuration run could not start"))?;

        if !result.succeeded() {
            error!(%host, exit_code = result.exit_code, "remote configuration run failed");
            return Err(TriggerError::ExecutionFailed {
                host: host.clone(),
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }

        info!(
            %host,
            elapsed_ms = result.finished_at.millis_since(result.started_at),
            "remote configuration run finished"
        );
        Ok(result)
    }
}
