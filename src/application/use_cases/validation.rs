use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::error::Result;
use crate::domain::identifier::identifiers_match;
use crate::domain::scan::{Validation, ValidationOutcome};
use crate::domain::scan_list::ValidationSummary;
use crate::infrastructure::db::lists::ListRepository;
use crate::infrastructure::db::scans::ScanRepository;
use crate::infrastructure::db::validations::ValidationRepository;

use super::scanning::checked_identifier;
use super::KnownPrefixes;

/// Second pass over a list: confirms scanned vehicles are still present.
pub struct ValidationUseCase {
    lists: Arc<ListRepository>,
    scans: Arc<ScanRepository>,
    validations: Arc<ValidationRepository>,
    prefixes: KnownPrefixes,
}

impl ValidationUseCase {
    pub fn new(
        lists: Arc<ListRepository>,
        scans: Arc<ScanRepository>,
        validations: Arc<ValidationRepository>,
        prefixes: KnownPrefixes,
    ) -> Self {
        Self {
            lists,
            scans,
            validations,
            prefixes,
        }
    }

    /// Marks the oldest unvalidated scan whose normalized identifier equals the
    /// normalized input.
    pub async fn validate(&self, list_id: i64, raw: &str) -> Result<ValidationOutcome> {
        let (identifier, wanted) = checked_identifier(raw, self.prefixes.as_slice())?;
        self.lists.get_list(list_id).await?;

        // A concurrent request may claim the chosen scan first. Re-read and move on.
        loop {
            let rows = self.scans.list_scan_rows(list_id).await?;
            let mut matches = rows
                .iter()
                .filter(|row| {
                    identifiers_match(&row.scan.identifier, identifier, self.prefixes.as_slice())
                })
                .peekable();

            if matches.peek().is_none() {
                debug!(list_id, identifier = %wanted, "Identifier not in list");
                return Ok(ValidationOutcome::NotInList);
            }

            let Some(target) = matches.find(|row| row.validated_at.is_none()) else {
                let total_validated = self.validations.count_validated(list_id).await?;
                debug!(list_id, identifier = %wanted, "Identifier already validated");
                return Ok(ValidationOutcome::AlreadyValidated { total_validated });
            };

            let inserted = self
                .validations
                .insert_validation(list_id, target.scan.id, &wanted, Utc::now())
                .await?;
            if inserted.is_none() {
                debug!(list_id, scan_id = target.scan.id, "Scan validated by another request");
                continue;
            }

            let total_validated = self.validations.count_validated(list_id).await?;
            info!(
                list_id,
                scan_id = target.scan.id,
                identifier = %wanted,
                total_validated,
                "Scan validated"
            );
            return Ok(ValidationOutcome::Validated { total_validated });
        }
    }

    /// Clears the validation of every scan matching `raw`.
    pub async fn unvalidate(&self, list_id: i64, raw: &str) -> Result<ValidationOutcome> {
        let (identifier, wanted) = checked_identifier(raw, self.prefixes.as_slice())?;
        self.lists.get_list(list_id).await?;

        let rows = self.scans.list_scan_rows(list_id).await?;
        let matching: Vec<i64> = rows
            .iter()
            .filter(|row| {
                identifiers_match(&row.scan.identifier, identifier, self.prefixes.as_slice())
            })
            .map(|row| row.scan.id)
            .collect();
        if matching.is_empty() {
            return Ok(ValidationOutcome::NotInList);
        }

        let mut removed = 0;
        for scan_id in matching {
            removed += self.validations.delete_for_scan(scan_id).await?;
        }
        let total_validated = self.validations.count_validated(list_id).await?;
        info!(list_id, identifier = %wanted, removed, total_validated, "Scan unvalidated");
        Ok(ValidationOutcome::Unvalidated { total_validated })
    }

    pub async fn finish_validation(&self, list_id: i64) -> Result<ValidationSummary> {
        self.lists.get_list(list_id).await?;
        let validation_timestamp = Utc::now();
        self.lists
            .set_validated(list_id, Some(validation_timestamp))
            .await?;

        let validated = self.validations.count_validated(list_id).await?;
        let total = self.scans.count_scans(list_id).await?;
        info!(list_id, validated, total, "Validation finished");
        Ok(ValidationSummary {
            list_id,
            validated,
            total,
            validation_timestamp,
        })
    }

    pub async fn list_validations(&self, list_id: i64) -> Result<Vec<Validation>> {
        self.lists.get_list(list_id).await?;
        self.validations.list_validations(list_id).await
    }

    /// Drops every validation of the list and clears its validated flag.
    pub async fn reset_validation(&self, list_id: i64) -> Result<u64> {
        self.lists.get_list(list_id).await?;
        let removed = self.validations.delete_for_list(list_id).await?;
        self.lists.set_validated(list_id, None).await?;
        info!(list_id, removed, "Validation reset");
        Ok(removed)
    }
}
