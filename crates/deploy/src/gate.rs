//! Transition gate: does this notification start a deployment?

use tracing::{debug, error};

use crate::{DeployError, StatusTransition};

/// Result of evaluating a [`StatusTransition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The artifact moved into the deploy status.
    Proceed,
    /// The status did not change.
    NoStatusChange,
    /// The status changed into something other than the deploy status.
    UnexpectedStatus,
}

/// Passes only transitions *into* the configured deploy status.
#[derive(Debug, Clone)]
pub struct TransitionGate<'a> {
    deploy_status: &'a str,
}

impl<'a> TransitionGate<'a> {
    /// Creates a gate for `deploy_status`.
    pub fn new(deploy_status: &'a str) -> Self {
        Self { deploy_status }
    }

    /// Classifies `transition` without logging.
    pub fn evaluate(&self, transition: &StatusTransition) -> GateDecision {
        if transition.is_unchanged() {
            GateDecision::NoStatusChange
        } else if transition.after_status != self.deploy_status {
            GateDecision::UnexpectedStatus
        } else {
            GateDecision::Proceed
        }
    }

    /// Returns `true` if the invocation should continue, logging the reason
    /// when it should not.
    pub fn should_proceed(&self, transition: &StatusTransition) -> bool {
        self.check(transition).is_ok()
    }

    /// Like [`Self::should_proceed`], but returns the stop as a [`DeployError`].
    ///
    /// # Errors
    ///
    /// [`DeployError::NoStatusChange`] (logged at debug) or
    /// [`DeployError::UnexpectedStatus`] (logged at error).
    pub fn check(&self, transition: &StatusTransition) -> Result<(), DeployError> {
        match self.evaluate(transition) {
            GateDecision::Proceed => Ok(()),
            GateDecision::NoStatusChange => {
                debug!(status = %transition.after_status, "No change in status field, skipping this event");
                Err(DeployError::NoStatusChange {
                    status: transition.after_status.clone(),
                })
            }
            GateDecision::UnexpectedStatus => {
                error!(
                    expected = %self.deploy_status,
                    actual = %transition.after_status,
                    "Status change is not the expected status, skipping this event"
                );
                Err(DeployError::UnexpectedStatus {
                    expected: self.deploy_status.to_string(),
                    actual: transition.after_status.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_passes_transition_into_deploy() {
        let gate = TransitionGate::new("Deploy");

        assert!(gate.should_proceed(&StatusTransition::new("Open", "Deploy")));
        assert!(gate.should_proceed(&StatusTransition::new("", "Deploy")));
    }

    #[test]
    fn test_gate_stops_when_status_unchanged() {
        let gate = TransitionGate::new("Deploy");

        for status in ["Deploy", "Open", ""] {
            let transition = StatusTransition::new(status, status);
            assert_eq!(gate.evaluate(&transition), GateDecision::NoStatusChange);
            assert!(!gate.should_proceed(&transition));
        }
    }

    #[test]
    fn test_gate_stops_on_other_statuses_regardless_of_before() {
        let gate = TransitionGate::new("Deploy");

        for before in ["Open", "Deploy", "", "Closed"] {
            let transition = StatusTransition::new(before, "Resolved");
            assert_eq!(gate.evaluate(&transition), GateDecision::UnexpectedStatus);
        }
    }

    #[test]
    fn test_gate_comparison_is_case_sensitive() {
        let gate = TransitionGate::new("Deploy");

        assert_eq!(
            gate.check(&StatusTransition::new("Open", "deploy")),
            Err(DeployError::UnexpectedStatus {
                expected: "Deploy".into(),
                actual: "deploy".into(),
            })
        );
    }
}
