//! Persisted deploy records and the container that holds them.
//!
//! A record is stored as a JSON object whose parameters live under a key equal
//! to the record id:
//!
//! ```json
//! {
//!   "id": "web1_example_com_param",
//!   "web1_example_com_param": {
//!     "frsid": "rel-42",
//!     "artifact_id": "artf1001",
//!     "tracker_id": "tracker1002"
//!   }
//! }
//! ```
//!
//! Keys the hook does not own, at either level, are carried through a
//! load/save cycle untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    ArtifactId, ContainerName, ExtraFields, FlexFieldSnapshot, RecordId, ReleaseId, StoreError,
    TrackerFolderId,
};

const ID_KEY: &str = "id";

/// A named collection of deploy records (a data bag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployContainer {
    /// Container name.
    pub name: ContainerName,
}

/// The three values the hook maintains for a host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployParams {
    /// Release last moved to "Deploy" for this host.
    #[serde(rename = "frsid")]
    pub release_id: Option<ReleaseId>,
    /// Tracker artifact that carried the release.
    pub artifact_id: Option<ArtifactId>,
    /// Tracker folder of that artifact.
    #[serde(rename = "tracker_id")]
    pub tracker_folder_id: Option<TrackerFolderId>,
    /// Parameters written by other tools.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Deploy record for one host.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployRecord {
    id: RecordId,
    container: ContainerName,
    /// Parameters maintained by the hook.
    pub params: DeployParams,
    extra: Map<String, Value>,
}

impl DeployRecord {
    /// Creates an empty record that has not been stored yet.
    pub fn new(container: ContainerName, id: RecordId) -> Self {
        Self {
            id,
            container,
            params: DeployParams::default(),
            extra: Map::new(),
        }
    }

    /// Record id.
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Container the record belongs to.
    pub fn container(&self) -> &ContainerName {
        &self.container
    }

    /// Overwrites the hook-owned parameters.
    ///
    /// Previous values are discarded, including when a new value is absent.
    pub fn apply(&mut self, snapshot: &FlexFieldSnapshot, extra: &ExtraFields) {
        self.params.release_id = Some(snapshot.release_id.clone());
        self.params.artifact_id = extra.artifact_id.clone();
        self.params.tracker_folder_id = extra.tracker_folder_id.clone();
    }

    /// Encodes the record in its stored JSON shape.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] if a preserved parameter cannot be encoded.
    pub fn to_json(&self) -> Result<Value, StoreError> {
        let params = serde_json::to_value(&self.params).map_err(|e| StoreError::Decode {
            message: e.to_string(),
        })?;

        let mut object = self.extra.clone();
        object.insert(ID_KEY.to_string(), Value::String(self.id.as_str().to_string()));
        object.insert(self.id.as_str().to_string(), params);
        Ok(Value::Object(object))
    }

    /// Decodes a record read from `container`.
    ///
    /// A record with no parameter object yet decodes with default parameters.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] if the value is not an object, has no
    /// string `id`, or its parameter entry is not an object.
    pub fn from_json(container: ContainerName, value: Value) -> Result<Self, StoreError> {
        let decode = |message: &str| StoreError::Decode {
            message: message.to_string(),
        };

        let Value::Object(mut object) = value else {
            return Err(decode("record is not a JSON object"));
        };
        let id = object
            .remove(ID_KEY)
            .and_then(|v| v.as_str().and_then(RecordId::from_stored))
            .ok_or_else(|| decode("record has no string 'id'"))?;

        let params = match object.remove(id.as_str()) {
            None | Some(Value::Null) => DeployParams::default(),
            Some(v @ Value::Object(_)) => serde_json::from_value(v).map_err(|e| StoreError::Decode {
                message: e.to_string(),
            })?,
            Some(_) => return Err(decode("record parameters are not a JSON object")),
        };

        Ok(Self {
            id,
            container,
            params,
            extra: object,
        })
    }
}
