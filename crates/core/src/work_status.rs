//! Publication status of a work.
//!
//! Stored as upper-case text in `works.status`. The status gates who can
//! see a work: `Approved` is public, `Pending` is visible by direct lookup
//! but kept out of listings, `Draft` is visible only to its creator.

use serde::{Deserialize, Serialize};

/// Defaults to `Approved`, matching the column default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkStatus {
    Draft,
    Pending,
    #[default]
    Approved,
}

impl WorkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::Draft => "DRAFT",
            WorkStatus::Pending => "PENDING",
            WorkStatus::Approved => "APPROVED",
        }
    }

    /// Parse the stored representation. Case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Some(WorkStatus::Draft),
            "PENDING" => Some(WorkStatus::Pending),
            "APPROVED" => Some(WorkStatus::Approved),
            _ => None,
        }
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_stored_values() {
        for status in [WorkStatus::Draft, WorkStatus::Pending, WorkStatus::Approved] {
            assert_eq!(WorkStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(WorkStatus::parse(" pending "), Some(WorkStatus::Pending));
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(WorkStatus::parse("ARCHIVED"), None);
        assert_eq!(WorkStatus::parse(""), None);
    }

    #[test]
    fn serde_uses_upper_case() {
        let json = serde_json::to_string(&WorkStatus::Approved).unwrap();
        assert_eq!(json, "\"APPROVED\"");
        let parsed: WorkStatus = serde_json::from_str("\"DRAFT\"").unwrap();
        assert_eq!(parsed, WorkStatus::Draft);
    }
}
