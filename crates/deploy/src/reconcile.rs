//! Fetch-or-create and overwrite of the per-host deploy record.

use tracing::{debug, error, info};

use crate::{
    ContainerName, DeployContainer, DeployRecord, DeployStore, ExtraFields, FlexFieldSnapshot,
    Lookup, ReconcileError, RecordId, StoreOperation,
};

/// Writes the release for a host into the store.
///
/// Last write wins: an existing record is overwritten without comparing its
/// previous values, and nothing guards against two invocations racing on the
/// same host.
pub struct RecordReconciler<'a, S: DeployStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: DeployStore + ?Sized> RecordReconciler<'a, S> {
    /// Creates a reconciler over `store`.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Ensures the container exists, then creates or updates the record for
    /// `after.target_host` and saves it.
    ///
    /// Replaying the same inputs stores the same parameter values.
    ///
    /// # Errors
    ///
    /// [`ReconcileError::StoreUnavailable`] for any store failure other than a
    /// "not found" lookup. Nothing is retried.
    pub async fn reconcile(
        &self,
        container: &ContainerName,
        after: &FlexFieldSnapshot,
        extra: &ExtraFields,
    ) -> Result<DeployRecord, ReconcileError> {
        self.ensure_container(container).await?;

        let id = RecordId::for_host(&after.target_host);
        let mut record = match self
            .store
            .load_record(container, &id)
            .await
            .map_err(ReconcileError::store(StoreOperation::LoadRecord))
            .inspect_err(|e| error!(error = %e, "failed to load deploy record"))?
        {
            Lookup::Found(record) => record,
            Lookup::NotFound => {
                debug!(%container, record_id = %id, "creating a new deploy record");
                DeployRecord::new(container.clone(), id)
            }
        };

        record.apply(after, extra);

        self.store
            .save_record(&record)
            .await
            .map_err(ReconcileError::store(StoreOperation::SaveRecord))
            .inspect_err(|e| error!(error = %e, "failed to save deploy record"))?;

        info!(
            %container,
            record_id = %record.id(),
            release_id = %after.release_id,
            "deploy record committed"
        );
        Ok(record)
    }

    async fn ensure_container(&self, name: &ContainerName) -> Result<DeployContainer, ReconcileError> {
        let lookup = self
            .store
            .load_container(name)
            .await
            .map_err(ReconcileError::store(StoreOperation::LoadContainer))
            .inspect_err(|e| error!(error = %e, "failed to load deploy container"))?;

        match lookup {
            Lookup::Found(container) => Ok(container),
            Lookup::NotFound => {
                debug!(container = %name, "creating a new deploy container");
                self.store
                    .create_container(name)
                    .await
                    .map_err(ReconcileError::store(StoreOperation::CreateContainer))
                    .inspect_err(|e| error!(error = %e, "failed to create deploy container"))
            }
        }
    }
}
