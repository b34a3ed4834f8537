use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DuplicateOccurrence {
    pub list_id: i64,
    pub list_name: String,
    pub warehouse: String,
    pub scan_id: i64,
    pub identifier: String,
    pub scanned_at: DateTime<Utc>,
}

/// One normalized identifier found in two or more lists.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DuplicateGroup {
    pub identifier: String,
    pub occurrences: Vec<DuplicateOccurrence>,
}

impl DuplicateGroup {
    pub fn list_count(&self) -> usize {
        let mut ids: Vec<i64> = self.occurrences.iter().map(|o| o.list_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}
