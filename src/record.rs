//! Record kinds and their declared sensitive fields.
//!
//! The catalogue is fixed and the field sets are part of the stored-data
//! contract: every writer must encrypt exactly these fields, or readers of
//! the shared backend will see cleartext where they expect envelopes (and
//! vice versa).

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kinds of records persisted in the shared backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Symptom,
    Solution,
    Child,
}

impl RecordKind {
    /// The field names that must always be stored as envelopes for this
    /// kind. Everything else is persisted as-is.
    pub fn sensitive_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Symptom => &["name"],
            Self::Solution => &["description", "time_to_relief", "notes"],
            Self::Child => &["name"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Symptom => "symptom",
            Self::Solution => "solution",
            Self::Child => "child",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_field_sets() {
        // These sets interoperate with already-persisted ciphertext and
        // must not drift.
        assert_eq!(RecordKind::Symptom.sensitive_fields(), &["name"]);
        assert_eq!(
            RecordKind::Solution.sensitive_fields(),
            &["description", "time_to_relief", "notes"]
        );
        assert_eq!(RecordKind::Child.sensitive_fields(), &["name"]);
    }

    #[test]
    fn test_serde_names_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&RecordKind::Symptom).unwrap(),
            "\"symptom\""
        );
        assert_eq!(
            serde_json::from_str::<RecordKind>("\"child\"").unwrap(),
            RecordKind::Child
        );
    }
}
