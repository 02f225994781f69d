//! Port traits implemented by infrastructure crates.
//!
//! The domain never talks to a network or spawns a process itself. The
//! `databag` crate supplies a [`DeployStore`]; the `remote` crate supplies a
//! [`RemoteExecutor`].

use async_trait::async_trait;

use crate::{
    CommandSpec, ContainerName, DeployContainer, DeployRecord, ExecutionResult, ExecutorError,
    Lookup, RecordId, StoreError, TargetHost,
};

/// Durable key/value store holding deploy records.
///
/// Implementations return [`Lookup::NotFound`] for a missing container or
/// record and reserve `Err` for every other failure.
#[async_trait]
pub trait DeployStore: Send + Sync {
    /// Loads the container named `name`.
    async fn load_container(&self, name: &ContainerName) -> Result<Lookup<DeployContainer>, StoreError>;

    /// Creates and persists an empty container named `name`.
    async fn create_container(&self, name: &ContainerName) -> Result<DeployContainer, StoreError>;

    /// Loads record `id` from `container`.
    async fn load_record(
        &self,
        container: &ContainerName,
        id: &RecordId,
    ) -> Result<Lookup<DeployRecord>, StoreError>;

    /// Persists `record`, creating it if the store does not have it yet.
    async fn save_record(&self, record: &DeployRecord) -> Result<(), StoreError>;
}

/// Runs a command on a remote host.
///
/// A non-zero exit is reported as a normal [`ExecutionResult`]; the caller
/// decides what it means. `Err` is reserved for failing to run at all.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Runs `spec` against `host` and waits for it to finish.
    async fn run_remote(&self, host: &TargetHost, spec: &CommandSpec) -> Result<ExecutionResult, ExecutorError>;
}
