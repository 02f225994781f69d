//! Recording in-memory fakes of the two ports.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use deploy::{
    CommandSpec, ContainerName, DeployContainer, DeployRecord, DeployStore, ExecutionResult,
    ExecutorError, Lookup, NotificationFieldSet, RecordId, RemoteExecutor, StoreError, TargetHost,
    Timestamp,
};

/// One call observed by a fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    LoadContainer(String),
    CreateContainer(String),
    LoadRecord(String, String),
    SaveRecord(String, String),
    RunRemote(String, CommandSpec),
}

#[derive(Default)]
pub struct MemoryStore {
    containers: Mutex<BTreeMap<String, BTreeMap<String, serde_json::Value>>>,
    calls: Mutex<Vec<Call>>,
    /// When set, every operation fails with this error.
    pub fail_with: Mutex<Option<StoreError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn has_container(&self, name: &str) -> bool {
        self.containers.lock().unwrap().contains_key(name)
    }

    pub fn stored(&self, container: &str, id: &str) -> Option<serde_json::Value> {
        self.containers
            .lock()
            .unwrap()
            .get(container)
            .and_then(|c| c.get(id).cloned())
    }

    pub fn insert_raw(&self, container: &str, id: &str, value: serde_json::Value) {
        self.containers
            .lock()
            .unwrap()
            .entry(container.to_string())
            .or_default()
            .insert(id.to_string(), value);
    }

    fn record(&self, call: Call) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_with.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DeployStore for MemoryStore {
    async fn load_container(&self, name: &ContainerName) -> Result<Lookup<DeployContainer>, StoreError> {
        self.record(Call::LoadContainer(name.to_string()))?;
        if self.has_container(name.as_str()) {
            Ok(Lookup::Found(DeployContainer { name: name.clone() }))
        } else {
            Ok(Lookup::NotFound)
        }
    }

    async fn create_container(&self, name: &ContainerName) -> Result<DeployContainer, StoreError> {
        self.record(Call::CreateContainer(name.to_string()))?;
        self.containers
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default();
        Ok(DeployContainer { name: name.clone() })
    }

    async fn load_record(
        &self,
        container: &ContainerName,
        id: &RecordId,
    ) -> Result<Lookup<DeployRecord>, StoreError> {
        self.record(Call::LoadRecord(container.to_string(), id.to_string()))?;
        match self.stored(container.as_str(), id.as_str()) {
            Some(v) => Ok(Lookup::Found(DeployRecord::from_json(container.clone(), v)?)),
            None => Ok(Lookup::NotFound),
        }
    }

    async fn save_record(&self, record: &DeployRecord) -> Result<(), StoreError> {
        self.record(Call::SaveRecord(
            record.container().to_string(),
            record.id().to_string(),
        ))?;
        let value = record.to_json()?;
        self.insert_raw(record.container().as_str(), record.id().as_str(), value);
        Ok(())
    }
}

pub struct FakeExecutor {
    exit_code: i32,
    calls: Mutex<Vec<Call>>,
}

impl FakeExecutor {
    pub fn succeeding() -> Self {
        Self::exiting_with(0)
    }

    pub fn exiting_with(exit_code: i32) -> Self {
        Self {
            exit_code,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteExecutor for FakeExecutor {
    async fn run_remote(&self, host: &TargetHost, spec: &CommandSpec) -> Result<ExecutionResult, ExecutorError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::RunRemote(host.to_string(), spec.clone()));
        let now = Timestamp::now();
        Ok(ExecutionResult {
            host: host.clone(),
            exit_code: self.exit_code,
            stdout: format!("{}: chef-client run", host),
            stderr: if self.exit_code == 0 {
                String::new()
            } else {
                "ssh: connect to host refused".to_string()
            },
            started_at: now,
            finished_at: now,
        })
    }
}

/// A notification moving `host` from `before` to `after` with release `release`.
pub fn notification(before: &str, after: &str, host: &str, release: &str) -> NotificationFieldSet {
    NotificationFieldSet::from_vars([
        ("PATH", "/usr/bin"),
        ("tf_original_Status", before),
        ("tf_updated_Status", after),
        ("tf_updated_Id", "artf1001"),
        ("tf_updated_FolderId", "tracker1002"),
        ("tf_original_flex_field_0_name", "Deploy To"),
        ("tf_original_flex_field_0_value", host),
        ("tf_original_flex_field_1_name", "FRSID"),
        ("tf_original_flex_field_1_value", release),
        ("tf_updated_flex_field_0_name", "Deploy To"),
        ("tf_updated_flex_field_0_value", host),
        ("tf_updated_flex_field_1_name", "FRSID"),
        ("tf_updated_flex_field_1_value", release),
    ])
}
