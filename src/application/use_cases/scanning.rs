use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::error::{AppError, Result};
use crate::domain::identifier::{normalize, sanitize_raw, MAX_IDENTIFIER_LEN};
use crate::domain::scan::ScanOutcome;
use crate::infrastructure::db::lists::ListRepository;
use crate::infrastructure::db::scans::ScanRepository;

use super::KnownPrefixes;

pub struct ScanUseCase {
    lists: Arc<ListRepository>,
    scans: Arc<ScanRepository>,
    prefixes: KnownPrefixes,
}

impl ScanUseCase {
    pub fn new(
        lists: Arc<ListRepository>,
        scans: Arc<ScanRepository>,
        prefixes: KnownPrefixes,
    ) -> Self {
        Self {
            lists,
            scans,
            prefixes,
        }
    }

    /// Stores one scanned identifier. Battery lists answer `Duplicate` instead
    /// of storing an identifier they already hold.
    pub async fn record_scan(&self, list_id: i64, raw: &str) -> Result<ScanOutcome> {
        let (identifier, normalized) = checked_identifier(raw, self.prefixes.as_slice())?;
        let list = self.lists.get_list(list_id).await?;

        let scan = if list.kind.rejects_repeats() {
            let inserted = self
                .scans
                .insert_unique_scan(list_id, identifier, &normalized, Utc::now())
                .await?;
            match inserted {
                Some(scan) => scan,
                None => {
                    let total = self.scans.count_scans(list_id).await?;
                    debug!(list_id, identifier = %normalized, "Repeated identifier rejected");
                    return Ok(ScanOutcome::Duplicate { total });
                }
            }
        } else {
            self.scans
                .insert_scan(list_id, identifier, Utc::now())
                .await?
        };

        let total = self.scans.count_scans(list_id).await?;
        info!(
            list_id,
            scan_id = scan.id,
            identifier = %scan.identifier,
            total,
            "Scan recorded"
        );
        Ok(ScanOutcome::Recorded { total })
    }

    /// Removes one entry and returns the remaining count.
    pub async fn delete_scan(&self, list_id: i64, scan_id: i64) -> Result<i64> {
        self.lists.get_list(list_id).await?;
        self.scans.delete_scan(list_id, scan_id).await?;
        let total = self.scans.count_scans(list_id).await?;
        info!(list_id, scan_id, total, "Scan deleted");
        Ok(total)
    }
}

/// Returns the form to store and its normalized key.
pub(crate) fn checked_identifier<'a, S: AsRef<str>>(
    raw: &'a str,
    prefixes: &[S],
) -> Result<(&'a str, String)> {
    let identifier = sanitize_raw(raw);
    if identifier.is_empty() {
        return Err(AppError::ValidationError(
            "Identifier must not be empty.".to_string(),
        ));
    }
    if identifier.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(AppError::ValidationError(format!(
            "Identifier is longer than {} characters.",
            MAX_IDENTIFIER_LEN
        )));
    }
    let normalized = normalize(identifier, prefixes);
    if normalized.is_empty() {
        return Err(AppError::ValidationError(format!(
            "Identifier '{}' has no id after its prefix.",
            identifier
        )));
    }
    Ok((identifier, normalized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::test_support::TestContext;
    use crate::domain::identifier::DEFAULT_KNOWN_PREFIXES;
    use crate::domain::scan_list::ListKind;

    #[tokio::test]
    async fn scooter_lists_count_every_scan() {
        let ctx = TestContext::new().await;
        let list = ctx.scooter_list("A", "North").await;

        assert_eq!(
            ctx.scanning.record_scan(list.id, "AB1").await.unwrap(),
            ScanOutcome::Recorded { total: 1 }
        );
        assert_eq!(
            ctx.scanning.record_scan(list.id, "https://tier.app/ab1").await.unwrap(),
            ScanOutcome::Recorded { total: 2 }
        );
    }

    #[tokio::test]
    async fn battery_lists_reject_repeats_after_normalization() {
        let ctx = TestContext::new().await;
        let list = ctx
            .lists
            .create_list("Batteries", "North", ListKind::Battery)
            .await
            .unwrap();

        assert_eq!(
            ctx.scanning.record_scan(list.id, "bat-77").await.unwrap(),
            ScanOutcome::Recorded { total: 1 }
        );
        assert_eq!(
            ctx.scanning.record_scan(list.id, " BAT-77 ").await.unwrap(),
            ScanOutcome::Duplicate { total: 1 }
        );
        assert_eq!(
            ctx.scanning.record_scan(list.id, "bat-78").await.unwrap(),
            ScanOutcome::Recorded { total: 2 }
        );
    }

    #[tokio::test]
    async fn stored_identifier_keeps_full_url() {
        let ctx = TestContext::new().await;
        let list = ctx.scooter_list("A", "North").await;
        ctx.scanning
            .record_scan(list.id, "  https://tier.app/ab1\n")
            .await
            .unwrap();
        let detail = ctx.lists.get_detail(list.id).await.unwrap();
        assert_eq!(detail.entries[0].scan.identifier, "https://tier.app/ab1");
    }

    #[tokio::test]
    async fn blank_and_oversized_identifiers_are_rejected() {
        let ctx = TestContext::new().await;
        let list = ctx.scooter_list("A", "North").await;

        assert!(matches!(
            ctx.scanning.record_scan(list.id, " \r\n").await,
            Err(AppError::ValidationError(_))
        ));
        let long = "X".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(matches!(
            ctx.scanning.record_scan(list.id, &long).await,
            Err(AppError::ValidationError(_))
        ));
        let exact = "X".repeat(MAX_IDENTIFIER_LEN);
        assert!(ctx.scanning.record_scan(list.id, &exact).await.is_ok());
    }

    #[tokio::test]
    async fn bare_prefix_is_rejected() {
        let ctx = TestContext::new().await;
        let list = ctx.scooter_list("A", "North").await;

        assert!(matches!(
            ctx.scanning.record_scan(list.id, "https://tier.app/").await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            ctx.scanning.record_scan(list.id, " https://tier.app/  \r").await,
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(ctx.scans_in(list.id).await, 0);
    }

    #[tokio::test]
    async fn concurrent_battery_repeats_store_one_scan() {
        let ctx = TestContext::new().await;
        let list = ctx
            .lists
            .create_list("Batteries", "North", ListKind::Battery)
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            ctx.scanning.record_scan(list.id, "BAT1"),
            ctx.scanning.record_scan(list.id, "bat1"),
        );
        let outcomes = [a.unwrap(), b.unwrap()];
        assert!(outcomes.contains(&ScanOutcome::Recorded { total: 1 }));
        assert!(outcomes.contains(&ScanOutcome::Duplicate { total: 1 }));
        assert_eq!(ctx.scans_in(list.id).await, 1);
    }

    #[test]
    fn checked_identifier_returns_stored_and_normalized_forms() {
        let (stored, normalized) =
            checked_identifier("  https://tier.app/ab1\n", &DEFAULT_KNOWN_PREFIXES).unwrap();
        assert_eq!(stored, "https://tier.app/ab1");
        assert_eq!(normalized, "AB1");
    }

    #[tokio::test]
    async fn scan_into_missing_list_is_not_found() {
        let ctx = TestContext::new().await;
        assert!(matches!(
            ctx.scanning.record_scan(404, "AB1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_scan_returns_remaining_total() {
        let ctx = TestContext::new().await;
        let list = ctx.scooter_list("A", "North").await;
        ctx.scanning.record_scan(list.id, "A1").await.unwrap();
        ctx.scanning.record_scan(list.id, "B1").await.unwrap();
        let detail = ctx.lists.get_detail(list.id).await.unwrap();

        let remaining = ctx
            .scanning
            .delete_scan(list.id, detail.entries[0].scan.id)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }
}
