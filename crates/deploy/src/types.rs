//! Shared value types for the DeployHook domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! structured values that flow between the core and its ports: lookup outcomes,
//! remote command descriptions, and execution results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TargetHost;

// ---------------------------------------------------------------------------
// Store lookups
// ---------------------------------------------------------------------------

/// Outcome of a keyed store lookup that completed without a transport failure.
///
/// "Not found" is an expected answer, not an error: the reconciler reacts to it
/// by creating the missing entity. Every other failure is reported through the
/// `Err` side of the port's `Result`.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// The entity exists.
    Found(T),
    /// The store has no entity under the requested key.
    NotFound,
}

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

/// The tracker status before and after the change that raised the notification.
///
/// A missing status variable is represented as an empty string, so two missing
/// statuses compare equal and read as "no change".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    /// Value of `tf_original_Status`.
    pub before_status: String,
    /// Value of `tf_updated_Status`.
    pub after_status: String,
}

impl StatusTransition {
    /// Creates a transition from its two status values.
    pub fn new(before_status: impl Into<String>, after_status: impl Into<String>) -> Self {
        Self {
            before_status: before_status.into(),
            after_status: after_status.into(),
        }
    }

    /// Returns `true` if the status did not change.
    pub fn is_unchanged(&self) -> bool {
        self.before_status == self.after_status
    }
}

// ---------------------------------------------------------------------------
// Remote execution
// ---------------------------------------------------------------------------

/// A fully rendered remote command, ready to hand to a
/// [`crate::RemoteExecutor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Node search query selecting the host(s) to run on (e.g. `"name:web1"`).
    pub query: String,
    /// Shell command executed on every matched node.
    pub command: String,
}

/// What the execution port observed for one remote command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Host the command was issued for.
    pub host: TargetHost,
    /// Process exit code. `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// When the command was started.
    pub started_at: Timestamp,
    /// When the command finished.
    pub finished_at: Timestamp,
}

impl ExecutionResult {
    /// Returns `true` if the command exited with status zero.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Milliseconds elapsed between `earlier` and `self` (negative if reversed).
    pub fn millis_since(self, earlier: Timestamp) -> i64 {
        (self.0 - earlier.0).num_milliseconds()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transition_detects_no_change() {
        assert!(StatusTransition::new("Deploy", "Deploy").is_unchanged());
        assert!(StatusTransition::new("", "").is_unchanged());
        assert!(!StatusTransition::new("Open", "Deploy").is_unchanged());
    }

    #[test]
    fn test_timestamp_millis_since() {
        let start = Timestamp::now();
        let end = Timestamp::from_utc(start.as_datetime() + chrono::Duration::milliseconds(250));

        assert_eq!(end.millis_since(start), 250);
    }
}
