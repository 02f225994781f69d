//! Core domain for DeployHook.
//!
//! DeployHook runs once per tracker notification. When an artifact moves into
//! the "Deploy" status it records the artifact's release against the target
//! host in a data-bag store, then asks that host to run configuration
//! management.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed ([`DeployStore`], [`RemoteExecutor`]);
//! infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`TargetHost`, `RecordId`, etc.) |
//! | [`types`] | Shared value types (`Lookup`, `CommandSpec`, `ExecutionResult`, etc.) |
//! | [`errors`] | Component and invocation error types |
//! | [`settings`] | Explicit runtime settings |
//! | [`fields`] | Payload decoding and flex-field extraction |
//! | [`gate`] | Status transition gate |
//! | [`record`] | Deploy record and container model |
//! | [`ports`] | Store and executor traits |
//! | [`reconcile`] | Fetch-or-create record reconciliation |
//! | [`trigger`] | Remote configuration-management trigger |
//! | [`invocation`] | End-to-end driver |

pub mod errors;
pub mod fields;
pub mod gate;
pub mod identifiers;
pub mod invocation;
pub mod ports;
pub mod reconcile;
pub mod record;
pub mod settings;
pub mod trigger;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{
    DeployError, ExecutorError, ExtractionError, ReconcileError, StoreError, StoreOperation,
    TriggerError,
};
pub use fields::{
    extract, ExtraFields, FlexFieldSnapshot, FlexSlot, NotificationFieldSet, SnapshotSide,
};
pub use gate::{GateDecision, TransitionGate};
pub use identifiers::{
    ArtifactId, ContainerName, InvocationId, RecordId, ReleaseId, TargetHost, TrackerFolderId,
};
pub use invocation::{Invocation, InvocationReport, InvocationStage};
pub use ports::{DeployStore, RemoteExecutor};
pub use reconcile::RecordReconciler;
pub use record::{DeployContainer, DeployParams, DeployRecord};
pub use settings::{DeploySettings, FlexFieldNames, RemoteCommand};
pub use trigger::DeploymentTrigger;
pub use types::{CommandSpec, ExecutionResult, Lookup, StatusTransition, Timestamp};
