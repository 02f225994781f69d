//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! a [`TargetHost`] with a [`ReleaseId`] even though both are strings under the
//! hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one invocation of the hook (one tracker notification).
///
/// Generated fresh for every process run; attached to the invocation span so
/// all log lines from a single event can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed (tracker payload / store keys)
// ---------------------------------------------------------------------------

string_id! {
    /// The node a release is deployed to, taken from the `"Deploy To"` flex field.
    TargetHost
}

string_id! {
    /// Release identifier taken from the `"FRSID"` flex field.
    ReleaseId
}

string_id! {
    /// Tracker artifact the notification was raised for (`tf_updated_Id`).
    ArtifactId
}

string_id! {
    /// Tracker folder containing the artifact (`tf_updated_FolderId`).
    TrackerFolderId
}

string_id! {
    /// Name of the store container (data bag) holding every deploy record.
    ContainerName
}

/// Key of a [`crate::DeployRecord`] within its container.
///
/// Always derived from a [`TargetHost`] via [`RecordId::for_host`], or
/// restored verbatim from the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Suffix appended to every host-derived record id.
    pub const SUFFIX: &'static str = "_param";

    /// Derives the record id for `host`.
    ///
    /// Literal dots are replaced with underscores and [`Self::SUFFIX`] is
    /// appended; no other characters are rewritten.
    pub fn for_host(host: &TargetHost) -> Self {
        Self(format!("{}{}", host.as_str().replace('.', "_"), Self::SUFFIX))
    }

    /// Wraps an id read back from the store, returning `None` if it is empty.
    pub fn from_stored(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_ids_reject_empty_values() {
        assert!(TargetHost::new("").is_none());
        assert!(ReleaseId::new("").is_none());
        assert_eq!(TargetHost::new("web1").unwrap().as_str(), "web1");
    }

    #[test]
    fn test_record_id_replaces_dots_and_appends_suffix() {
        let host = TargetHost::new("web1.example.com").unwrap();
        let id = RecordId::for_host(&host);

        assert_eq!(id.as_str(), "web1_example_com_param");
        assert!(!id.as_str().contains('.'));
    }

    #[test]
    fn test_record_id_is_a_pure_function_of_host() {
        let a = TargetHost::new("db-2.internal").unwrap();
        let b = TargetHost::new("db-2.internal").unwrap();

        assert_eq!(RecordId::for_host(&a), RecordId::for_host(&b));
    }

    #[test]
    fn test_record_id_keeps_other_separators() {
        let host = TargetHost::new("app-01_blue").unwrap();

        assert_eq!(RecordId::for_host(&host).as_str(), "app-01_blue_param");
    }

    #[test]
    fn test_invocation_ids_are_unique() {
        assert_ne!(InvocationId::new_random(), InvocationId::new_random());
    }
}
