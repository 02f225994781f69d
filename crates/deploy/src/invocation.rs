//! One end-to-end run of the hook for a single tracker notification.
//!
//! ```text
//! Start → FieldsExtracted → GateChecked → RecordCommitted → Triggered → Done
//! ```
//!
//! Any error, including a gate stop, ends the run in the state it was in;
//! [`Invocation::stage`] reports that state and the failure is logged with it.
//! The record is always committed before the trigger runs; a trigger failure
//! leaves the committed record in place, and re-running the same notification
//! converges because reconciliation is idempotent.

use std::cell::Cell;

use tracing::{debug, error, info, Instrument};

use crate::{
    extract, DeployError, DeployRecord, DeploySettings, DeployStore, DeploymentTrigger,
    ExecutionResult, InvocationId, NotificationFieldSet, RecordReconciler, RemoteExecutor,
    SnapshotSide, TransitionGate,
};

/// Progress of an invocation through its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InvocationStage {
    /// Nothing has happened yet.
    Start,
    /// Both flex-field snapshots were extracted.
    FieldsExtracted,
    /// The transition gate passed.
    GateChecked,
    /// The deploy record was saved.
    RecordCommitted,
    /// The remote run finished successfully.
    Triggered,
    /// The invocation completed.
    Done,
}

impl std::fmt::Display for InvocationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::FieldsExtracted => "fields_extracted",
            Self::GateChecked => "gate_checked",
            Self::RecordCommitted => "record_committed",
            Self::Triggered => "triggered",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// What a successful invocation did.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationReport {
    /// Invocation identifier.
    pub id: InvocationId,
    /// The committed deploy record.
    pub record: DeployRecord,
    /// Result of the remote run.
    pub execution: ExecutionResult,
}

/// Drives one notification through extraction, gate, reconciliation and trigger.
pub struct Invocation<'a, S: ?Sized, E: ?Sized> {
    id: InvocationId,
    settings: &'a DeploySettings,
    store: &'a S,
    executor: &'a E,
    stage: Cell<InvocationStage>,
}

impl<'a, S, E> Invocation<'a, S, E>
where
    S: DeployStore + ?Sized,
    E: RemoteExecutor + ?Sized,
{
    /// Wires an invocation with a fresh [`InvocationId`].
    pub fn new(settings: &'a DeploySettings, store: &'a S, executor: &'a E) -> Self {
        Self {
            id: InvocationId::new_random(),
            settings,
            store,
            executor,
            stage: Cell::new(InvocationStage::Start),
        }
    }

    /// Invocation identifier.
    pub fn id(&self) -> InvocationId {
        self.id
    }

    /// The last stage reached. After a failed [`run`](Self::run) this is the
    /// stage the invocation stopped in.
    pub fn stage(&self) -> InvocationStage {
        self.stage.get()
    }

    /// Processes `fields`.
    ///
    /// # Errors
    ///
    /// The first [`DeployError`] encountered. Gate stops and missing fields
    /// return before the store or executor is touched.
    pub async fn run(&self, fields: &NotificationFieldSet) -> Result<InvocationReport, DeployError> {
        let span = tracing::info_span!("invocation", invocation_id = %self.id);
        async {
            let result = self.run_stages(fields).await;
            if let Err(e) = &result {
                let stage = self.stage();
                if e.is_gate_stop() {
                    // The gate has already logged the decision at its own level.
                    debug!(%stage, reason = %e, "invocation stopped at gate");
                } else {
                    error!(%stage, error = %e, "invocation stopped");
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_stages(&self, fields: &NotificationFieldSet) -> Result<InvocationReport, DeployError> {
        self.stage.set(InvocationStage::Start);
        debug!(variables = fields.len(), "tracker notification received");

        let names = &self.settings.flex_fields;
        let _before = extract(fields, SnapshotSide::Original, names)?;
        let after = extract(fields, SnapshotSide::Updated, names)?;
        self.advance(InvocationStage::FieldsExtracted);

        TransitionGate::new(&self.settings.deploy_status).check(&fields.status_transition())?;
        self.advance(InvocationStage::GateChecked);

        let record = RecordReconciler::new(self.store)
            .reconcile(&self.settings.container, &after, &fields.extra_fields())
            .await?;
        self.advance(InvocationStage::RecordCommitted);

        let execution = DeploymentTrigger::new(self.executor, &self.settings.remote)
            .trigger(&after.target_host)
            .await?;
        self.advance(InvocationStage::Triggered);

        self.advance(InvocationStage::Done);
        info!(host = %after.target_host, release_id = %after.release_id, "deployment triggered");
        Ok(InvocationReport {
            id: self.id,
            record,
            execution,
        })
    }

    fn advance(&self, next: InvocationStage) {
        debug_assert!(next > self.stage.get());
        self.stage.set(next);
        debug!(stage = %next, "invocation advanced");
    }
}
