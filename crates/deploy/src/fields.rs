//! Notification payload decoding and flex-field extraction.
//!
//! The tracker hands the hook one environment variable per field. Flex fields
//! arrive as sibling pairs sharing a slot identifier:
//!
//! ```text
//! tf_updated_flex_field_3_name  = "Deploy To"
//! tf_updated_flex_field_3_value = "web1.example.com"
//! ```
//!
//! [`NotificationFieldSet::flex_slots`] groups those pairs into [`FlexSlot`]s;
//! [`extract`] then picks out the two slots whose names it recognises.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    ArtifactId, ExtractionError, FlexFieldNames, ReleaseId, StatusTransition, TargetHost,
    TrackerFolderId,
};

/// Prefix shared by every tracker variable.
pub const VAR_PREFIX: &str = "tf_";

const UPDATED_ID_KEY: &str = "tf_updated_Id";
const UPDATED_FOLDER_ID_KEY: &str = "tf_updated_FolderId";

// ---------------------------------------------------------------------------
// Snapshot sides
// ---------------------------------------------------------------------------

/// Which half of the change a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSide {
    /// The artifact as it was before the change (`tf_original_*`).
    Original,
    /// The artifact after the change (`tf_updated_*`).
    Updated,
}

impl SnapshotSide {
    /// Prefix of this side's flex-field variables.
    pub fn flex_prefix(self) -> &'static str {
        match self {
            Self::Original => "tf_original_flex_field_",
            Self::Updated => "tf_updated_flex_field_",
        }
    }

    /// Key of this side's status variable.
    pub fn status_key(self) -> &'static str {
        match self {
            Self::Original => "tf_original_Status",
            Self::Updated => "tf_updated_Status",
        }
    }
}

impl std::fmt::Display for SnapshotSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Original => f.write_str("original"),
            Self::Updated => f.write_str("updated"),
        }
    }
}

// ---------------------------------------------------------------------------
// Field set
// ---------------------------------------------------------------------------

/// The flattened fields of one notification, restricted to tracker variables.
///
/// Keys iterate in lexicographic order, which is the scan order every
/// consumer relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFieldSet {
    fields: BTreeMap<String, String>,
}

impl NotificationFieldSet {
    /// Builds a field set from `(key, value)` pairs such as `std::env::vars()`,
    /// keeping only keys that start with [`VAR_PREFIX`].
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(VAR_PREFIX))
            .collect();
        Self { fields }
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Number of tracker variables held.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no tracker variables were supplied.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The before/after status pair. Missing statuses read as empty strings.
    pub fn status_transition(&self) -> StatusTransition {
        StatusTransition::new(
            self.get(SnapshotSide::Original.status_key()).unwrap_or_default(),
            self.get(SnapshotSide::Updated.status_key()).unwrap_or_default(),
        )
    }

    /// Scalar fields copied verbatim into the deploy record.
    pub fn extra_fields(&self) -> ExtraFields {
        ExtraFields {
            artifact_id: self.get(UPDATED_ID_KEY).and_then(ArtifactId::new),
            tracker_folder_id: self.get(UPDATED_FOLDER_ID_KEY).and_then(TrackerFolderId::new),
        }
    }

    /// Decodes one side's flex-field variables into slots.
    ///
    /// Keys under the side's prefix are split into a slot identifier and a
    /// `name` / `value` part; keys that carry neither part are ignored. Slots
    /// are returned in slot-identifier order.
    pub fn flex_slots(&self, side: SnapshotSide) -> Vec<FlexSlot> {
        let prefix = side.flex_prefix();
        let mut slots: BTreeMap<String, FlexSlot> = BTreeMap::new();

        for (key, value) in self.fields.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            let Some((slot_id, part)) = split_slot_key(rest) else {
                continue;
            };
            let slot = slots.entry(slot_id.clone()).or_insert_with(|| FlexSlot {
                slot: slot_id,
                name: None,
                value: None,
            });
            match part {
                SlotPart::Name => slot.name = Some(value.clone()),
                SlotPart::Value => slot.value = Some(value.clone()),
            }
        }

        slots.into_values().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NotificationFieldSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_vars(iter)
    }
}

/// One decoded flex-field slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlexSlot {
    /// Identifier shared by the slot's `name` and `value` keys.
    pub slot: String,
    /// The flex field's display name, if the payload carried one.
    pub name: Option<String>,
    /// The flex field's value, if the payload carried one.
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotPart {
    Name,
    Value,
}

impl SlotPart {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "name" => Some(Self::Name),
            "value" => Some(Self::Value),
            _ => None,
        }
    }
}

/// Splits the prefix-stripped remainder of a flex key into `(slot, part)`.
///
/// `3_name`, `name_3` and `name3` all decode to slot `3`. Underscore-delimited
/// segments are preferred; the last `name`/`value` segment wins.
fn split_slot_key(rest: &str) -> Option<(String, SlotPart)> {
    let segments: Vec<&str> = rest.split('_').collect();
    if let Some(pos) = segments.iter().rposition(|s| SlotPart::parse(s).is_some()) {
        let part = SlotPart::parse(segments[pos])?;
        let slot = segments
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != pos)
            .map(|(_, s)| *s)
            .collect::<Vec<_>>()
            .join("_");
        return Some((slot, part));
    }

    for (token, part) in [("name", SlotPart::Name), ("value", SlotPart::Value)] {
        if let Some(slot) = rest.strip_suffix(token).or_else(|| rest.strip_prefix(token)) {
            return Some((slot.to_string(), part));
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// A complete flex-field snapshot: both required fields are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlexFieldSnapshot {
    /// Host to deploy to.
    pub target_host: TargetHost,
    /// Release to deploy.
    pub release_id: ReleaseId,
}

/// Scalar tracker fields recorded alongside the release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraFields {
    /// Tracker artifact id.
    pub artifact_id: Option<ArtifactId>,
    /// Tracker folder id.
    pub tracker_folder_id: Option<TrackerFolderId>,
}

/// Extracts the target host and release id for one side of the change.
///
/// Scans the side's slots in order; a slot whose name equals one of `names`
/// sets the corresponding field to the slot's value, so the last matching slot
/// wins. A matching slot with a missing or empty value leaves the field absent.
///
/// # Errors
///
/// Returns [`ExtractionError::MissingField`] naming the first absent field.
pub fn extract(
    fields: &NotificationFieldSet,
    side: SnapshotSide,
    names: &FlexFieldNames,
) -> Result<FlexFieldSnapshot, ExtractionError> {
    let mut target_host = None;
    let mut release_id = None;

    for slot in fields.flex_slots(side) {
        let Some(name) = slot.name.as_deref() else {
            continue;
        };
        if name == names.target_host {
            target_host = slot.value.clone().and_then(TargetHost::new);
            debug!(%side, slot = %slot.slot, target_host = ?target_host, "target host set");
        }
        if name == names.release_id {
            release_id = slot.value.clone().and_then(ReleaseId::new);
            debug!(%side, slot = %slot.slot, release_id = ?release_id, "release id set");
        }
    }

    let missing = |field: &str| ExtractionError::MissingField {
        side,
        field: field.to_string(),
    };
    Ok(FlexFieldSnapshot {
        target_host: target_host.ok_or_else(|| missing(&names.target_host))?,
        release_id: release_id.ok_or_else(|| missing(&names.release_id))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_set(pairs: &[(&str, &str)]) -> NotificationFieldSet {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_from_vars_keeps_only_tracker_variables() {
        let fields = field_set(&[("HOME", "/root"), ("tf_updated_Status", "Deploy")]);

        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("tf_updated_Status"), Some("Deploy"));
        assert_eq!(fields.get("HOME"), None);
    }

    #[test]
    fn test_flex_slots_pair_name_and_value() {
        let fields = field_set(&[
            ("tf_updated_flex_field_0_name", "Deploy To"),
            ("tf_updated_flex_field_0_value", "web1"),
            ("tf_updated_flex_field_1_name", "FRSID"),
            ("tf_original_flex_field_0_name", "Other"),
        ]);

        let slots = fields.flex_slots(SnapshotSide::Updated);

        assert_eq!(
            slots,
            vec![
                FlexSlot {
                    slot: "0".into(),
                    name: Some("Deploy To".into()),
                    value: Some("web1".into()),
                },
                FlexSlot {
                    slot: "1".into(),
                    name: Some("FRSID".into()),
                    value: None,
                },
            ]
        );
    }

    #[test]
    fn test_split_slot_key_accepts_name_before_or_after_slot() {
        assert_eq!(split_slot_key("7_name"), Some(("7".into(), SlotPart::Name)));
        assert_eq!(split_slot_key("value_7"), Some(("7".into(), SlotPart::Value)));
        assert_eq!(split_slot_key("name7"), Some(("7".into(), SlotPart::Name)));
        assert_eq!(split_slot_key("7_type"), None);
    }

    #[test]
    fn test_extract_reads_both_fields() {
        let fields = field_set(&[
            ("tf_updated_flex_field_0_name", "Deploy To"),
            ("tf_updated_flex_field_0_value", "web1.example.com"),
            ("tf_updated_flex_field_1_name", "FRSID"),
            ("tf_updated_flex_field_1_value", "rel-42"),
        ]);

        let snapshot = extract(&fields, SnapshotSide::Updated, &FlexFieldNames::default()).unwrap();

        assert_eq!(snapshot.target_host.as_str(), "web1.example.com");
        assert_eq!(snapshot.release_id.as_str(), "rel-42");
    }

    #[test]
    fn test_extract_fails_when_release_value_is_missing() {
        let fields = field_set(&[
            ("tf_updated_flex_field_0_name", "Deploy To"),
            ("tf_updated_flex_field_0_value", "web1"),
            ("tf_updated_flex_field_1_name", "FRSID"),
        ]);

        let err = extract(&fields, SnapshotSide::Updated, &FlexFieldNames::default()).unwrap_err();

        assert_eq!(
            err,
            ExtractionError::MissingField {
                side: SnapshotSide::Updated,
                field: "FRSID".into(),
            }
        );
    }

    #[test]
    fn test_extract_treats_empty_value_as_absent() {
        let fields = field_set(&[
            ("tf_original_flex_field_0_name", "Deploy To"),
            ("tf_original_flex_field_0_value", ""),
            ("tf_original_flex_field_1_name", "FRSID"),
            ("tf_original_flex_field_1_value", "rel-1"),
        ]);

        let err = extract(&fields, SnapshotSide::Original, &FlexFieldNames::default()).unwrap_err();

        assert!(matches!(err, ExtractionError::MissingField { field, .. } if field == "Deploy To"));
    }

    #[test]
    fn test_extract_last_duplicate_slot_wins() {
        let fields = field_set(&[
            ("tf_updated_flex_field_0_name", "Deploy To"),
            ("tf_updated_flex_field_0_value", "first"),
            ("tf_updated_flex_field_5_name", "Deploy To"),
            ("tf_updated_flex_field_5_value", "second"),
            ("tf_updated_flex_field_9_name", "FRSID"),
            ("tf_updated_flex_field_9_value", "rel"),
        ]);

        let snapshot = extract(&fields, SnapshotSide::Updated, &FlexFieldNames::default()).unwrap();

        assert_eq!(snapshot.target_host.as_str(), "second");
    }

    #[test]
    fn test_extract_ignores_the_other_side() {
        let fields = field_set(&[
            ("tf_original_flex_field_0_name", "Deploy To"),
            ("tf_original_flex_field_0_value", "web1"),
            ("tf_original_flex_field_1_name", "FRSID"),
            ("tf_original_flex_field_1_value", "rel"),
        ]);

        assert!(extract(&fields, SnapshotSide::Original, &FlexFieldNames::default()).is_ok());
        assert!(extract(&fields, SnapshotSide::Updated, &FlexFieldNames::default()).is_err());
    }

    #[test]
    fn test_status_transition_and_extra_fields() {
        let fields = field_set(&[
            ("tf_original_Status", "Open"),
            ("tf_updated_Status", "Deploy"),
            ("tf_updated_Id", "artf1001"),
        ]);

        assert_eq!(fields.status_transition(), StatusTransition::new("Open", "Deploy"));
        let extra = fields.extra_fields();
        assert_eq!(extra.artifact_id.unwrap().as_str(), "artf1001");
        assert!(extra.tracker_folder_id.is_none());
    }
}
