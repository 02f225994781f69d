//! Error types for the DeployHook domain.
//!
//! Each component owns a narrow error enum ([`ExtractionError`],
//! [`ReconcileError`], [`TriggerError`]); the ports report transport failures
//! through [`StoreError`] and [`ExecutorError`]. [`DeployError`] is the
//! invocation-level union returned by [`crate::Invocation::run`].
//!
//! Every error is terminal for the invocation. Nothing in the core retries; the
//! only recovery is a "not found" lookup turning into a create, and that is
//! modelled as [`crate::Lookup::NotFound`] rather than as an error.

use thiserror::Error;

use crate::{SnapshotSide, TargetHost};

// ---------------------------------------------------------------------------
// Port errors
// ---------------------------------------------------------------------------

/// Failure reported by a [`crate::DeployStore`] implementation.
///
/// A missing container or record is never a `StoreError`; stores return
/// [`crate::Lookup::NotFound`] for that.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// The store could not be reached or the request did not complete.
    #[error("store transport failure: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The store answered with a status the adapter does not accept.
    #[error("store answered {status}: {body}")]
    UnexpectedStatus {
        /// Numeric response status.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The store's response could not be decoded.
    #[error("store response could not be decoded: {message}")]
    Decode {
        /// Description of the decoding problem.
        message: String,
    },
}

/// Failure reported by a [`crate::RemoteExecutor`] before a result exists.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutorError {
    /// The local command that performs the remote call could not be started.
    #[error("failed to start '{program}': {message}")]
    Spawn {
        /// Program that was being started.
        program: String,
        /// Operating-system error text.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Component errors
// ---------------------------------------------------------------------------

/// Errors produced by [`crate::fields::extract`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// A required flex field had no usable value after scanning the payload.
    #[error("required {side} flex field '{field}' is not defined in the tracker")]
    MissingField {
        /// Which snapshot was being extracted.
        side: SnapshotSide,
        /// Flex-field name that was missing (e.g. `"FRSID"`).
        field: String,
    },
}

/// The store operation that was in flight when a [`ReconcileError`] occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    /// Loading the container by name.
    LoadContainer,
    /// Creating a missing container.
    CreateContainer,
    /// Loading a record by container and id.
    LoadRecord,
    /// Saving the updated record.
    SaveRecord,
}

impl std::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::LoadContainer => "load container",
            Self::CreateContainer => "create container",
            Self::LoadRecord => "load record",
            Self::SaveRecord => "save record",
        };
        f.write_str(s)
    }
}

/// Errors produced by [`crate::RecordReconciler::reconcile`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconcileError {
    /// The store failed with anything other than "not found".
    #[error("store unavailable during {operation}: {source}")]
    StoreUnavailable {
        /// Operation that failed.
        operation: StoreOperation,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },
}

impl ReconcileError {
    pub(crate) fn store(operation: StoreOperation) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::StoreUnavailable { operation, source }
    }
}

/// Errors produced by [`crate::DeploymentTrigger::trigger`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TriggerError {
    /// The remote command ran and reported failure.
    #[error("remote run on '{host}' failed with exit code {exit_code}: {stderr}")]
    ExecutionFailed {
        /// Host the run was issued for.
        host: TargetHost,
        /// Exit code reported by the execution port.
        exit_code: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// The execution port could not run the command at all.
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

// ---------------------------------------------------------------------------
// Invocation-level errors
// ---------------------------------------------------------------------------

/// Every way an invocation can stop short of `Done`.
///
/// Gate stops ([`DeployError::NoStatusChange`], [`DeployError::UnexpectedStatus`])
/// are early exits rather than faults, but the process reports them the same
/// way: one log line and exit code 1.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeployError {
    /// A required flex field was missing from the notification.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The tracker status did not change.
    #[error("no change in status field ('{status}'), skipping this event")]
    NoStatusChange {
        /// The unchanged status value.
        status: String,
    },

    /// The status changed, but not into the deploy status.
    #[error("status changed to '{actual}', not the expected status '{expected}', skipping this event")]
    UnexpectedStatus {
        /// Configured deploy status.
        expected: String,
        /// Status the artifact moved to.
        actual: String,
    },

    /// The deploy record could not be reconciled.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// The remote configuration-management run failed.
    #[error(transparent)]
    Trigger(#[from] TriggerError),

    /// The runtime configuration is invalid.
    ///
    /// Produced at load time; an invocation never starts with an invalid config.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl DeployError {
    /// Process exit code for this error.
    ///
    /// All non-success paths exit identically.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Returns `true` for the two transition-gate stops.
    pub fn is_gate_stop(&self) -> bool {
        matches!(
            self,
            Self::NoStatusChange { .. } | Self::UnexpectedStatus { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_exits_with_one() {
        let errors = [
            DeployError::NoStatusChange {
                status: "Open".into(),
            },
            DeployError::Configuration {
                message: "x".into(),
            },
            DeployError::Extraction(ExtractionError::MissingField {
                side: SnapshotSide::Updated,
                field: "FRSID".into(),
            }),
        ];

        for e in errors {
            assert_eq!(e.exit_code(), 1);
        }
    }

    #[test]
    fn test_gate_stops_are_classified() {
        assert!(DeployError::UnexpectedStatus {
            expected: "Deploy".into(),
            actual: "Resolved".into(),
        }
        .is_gate_stop());
        assert!(!DeployError::Configuration {
            message: "x".into()
        }
        .is_gate_stop());
    }

    #[test]
    fn test_reconcile_error_names_the_operation() {
        let err = ReconcileError::store(StoreOperation::SaveRecord)(StoreError::UnexpectedStatus {
            status: 500,
            body: "boom".into(),
        });

        assert_eq!(
            err.to_string(),
            "store unavailable during save record: store answered 500: boom"
        );
    }

    #[test]
    fn test_missing_field_message() {
        let err = ExtractionError::MissingField {
            side: SnapshotSide::Original,
            field: "Deploy To".into(),
        };

        assert_eq!(
            err.to_string(),
            "required original flex field 'Deploy To' is not defined in the tracker"
        );
    }
}
