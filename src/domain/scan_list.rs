use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::domain::error::AppError;
use crate::domain::scan::ScanEntry;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    #[default]
    Scooter,
    Battery,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Scooter => "scooter",
            ListKind::Battery => "battery",
        }
    }

    /// Column header used in exports and on the scan pages.
    pub fn id_label(&self) -> &'static str {
        match self {
            ListKind::Scooter => "Scooter ID",
            ListKind::Battery => "Battery ID",
        }
    }

    /// Battery lists refuse the same identifier twice.
    pub fn rejects_repeats(&self) -> bool {
        matches!(self, ListKind::Battery)
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "scooter" => Ok(ListKind::Scooter),
            "battery" => Ok(ListKind::Battery),
            other => Err(AppError::ValidationError(format!(
                "Unknown list type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScanList {
    pub id: i64,
    pub name: String,
    pub warehouse: String,
    pub kind: ListKind,
    pub created_at: DateTime<Utc>,
    pub is_validated: bool,
    pub validation_timestamp: Option<DateTime<Utc>>,
}

/// Name and warehouse of a list, already trimmed.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct ListLabel {
    #[validate(length(min = 1, max = 100, message = "List name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Warehouse must be 1-100 characters"))]
    pub warehouse: String,
}

impl ListLabel {
    pub fn new(name: &str, warehouse: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            warehouse: warehouse.trim().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ListSummary {
    #[serde(flatten)]
    pub list: ScanList,
    pub scan_count: i64,
    pub validated_count: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ListDetail {
    #[serde(flatten)]
    pub list: ScanList,
    pub entries: Vec<ScanEntry>,
    pub validated_count: i64,
}

impl ListDetail {
    pub fn total(&self) -> i64 {
        self.entries.len() as i64
    }

    pub fn remaining(&self) -> i64 {
        self.total() - self.validated_count
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ValidationSummary {
    pub list_id: i64,
    pub validated: i64,
    pub total: i64,
    pub validation_timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_kind_parses_case_insensitively() {
        assert_eq!("Battery".parse::<ListKind>().unwrap(), ListKind::Battery);
        assert_eq!(" scooter ".parse::<ListKind>().unwrap(), ListKind::Scooter);
        assert_eq!("".parse::<ListKind>().unwrap(), ListKind::Scooter);
    }

    #[test]
    fn list_kind_rejects_unknown_values() {
        let err = "bike".parse::<ListKind>().unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn list_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ListKind::Battery).unwrap(),
            "\"battery\""
        );
    }

    #[test]
    fn list_label_trims_and_validates() {
        let label = ListLabel::new("  Morning  ", " Berlin-1 ");
        assert_eq!(label.name, "Morning");
        assert_eq!(label.warehouse, "Berlin-1");
        assert!(label.validate().is_ok());

        assert!(ListLabel::new("   ", "Berlin").validate().is_err());
        assert!(ListLabel::new("x", &"w".repeat(101)).validate().is_err());
    }

    #[test]
    fn only_battery_lists_reject_repeats() {
        assert!(ListKind::Battery.rejects_repeats());
        assert!(!ListKind::Scooter.rejects_repeats());
    }
}
