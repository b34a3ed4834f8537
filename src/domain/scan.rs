use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Scan {
    pub id: i64,
    pub list_id: i64,
    pub identifier: String,
    pub scanned_at: DateTime<Utc>,
}

/// A scan as shown in list views: the raw identifier, its short id and the
/// time it was confirmed during validation, if it was.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScanEntry {
    #[serde(flatten)]
    pub scan: Scan,
    pub short_id: String,
    pub validated_at: Option<DateTime<Utc>>,
}

impl ScanEntry {
    pub fn is_validated(&self) -> bool {
        self.validated_at.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    #[serde(rename = "success")]
    Recorded { total: i64 },
    Duplicate { total: i64 },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Validation {
    pub id: i64,
    pub list_id: i64,
    pub scan_id: i64,
    pub identifier: String,
    pub validated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationOutcome {
    #[serde(rename = "success")]
    Validated { total_validated: i64 },
    #[serde(rename = "success")]
    Unvalidated { total_validated: i64 },
    #[serde(rename = "duplicate")]
    AlreadyValidated { total_validated: i64 },
    NotInList,
}
