use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::duplicate::{DuplicateGroup, DuplicateOccurrence};
use crate::domain::error::Result;
use crate::domain::identifier::normalize;
use crate::infrastructure::db::scans::ScanRepository;

use super::KnownPrefixes;

pub struct DuplicateUseCase {
    scans: Arc<ScanRepository>,
    prefixes: KnownPrefixes,
}

impl DuplicateUseCase {
    pub fn new(scans: Arc<ScanRepository>, prefixes: KnownPrefixes) -> Self {
        Self { scans, prefixes }
    }

    /// Identifiers that were scanned into two or more different lists.
    pub async fn find_duplicates(&self, warehouse: Option<&str>) -> Result<Vec<DuplicateGroup>> {
        let warehouse = warehouse.map(str::trim).filter(|w| !w.is_empty());
        let occurrences = self.scans.list_occurrences(warehouse).await?;
        let scanned = occurrences.len();
        let groups = group_across_lists(occurrences, self.prefixes.as_slice());
        info!(
            warehouse = warehouse.unwrap_or("*"),
            scanned,
            duplicates = groups.len(),
            "Duplicate scan finished"
        );
        Ok(groups)
    }
}

pub(crate) fn group_across_lists<S: AsRef<str>>(
    occurrences: Vec<DuplicateOccurrence>,
    prefixes: &[S],
) -> Vec<DuplicateGroup> {
    let mut by_identifier: BTreeMap<String, Vec<DuplicateOccurrence>> = BTreeMap::new();
    for occurrence in occurrences {
        let key = normalize(&occurrence.identifier, prefixes);
        if key.is_empty() {
            continue;
        }
        by_identifier.entry(key).or_default().push(occurrence);
    }

    by_identifier
        .into_iter()
        .map(|(identifier, mut occurrences)| {
            occurrences.sort_by(|a, b| {
                a.list_id
                    .cmp(&b.list_id)
                    .then(a.scanned_at.cmp(&b.scanned_at))
                    .then(a.scan_id.cmp(&b.scan_id))
            });
            DuplicateGroup {
                identifier,
                occurrences,
            }
        })
        .filter(|group| group.list_count() > 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::test_support::TestContext;
    use crate::domain::identifier::DEFAULT_KNOWN_PREFIXES;
    use chrono::Utc;

    fn occurrence(list_id: i64, scan_id: i64, identifier: &str) -> DuplicateOccurrence {
        DuplicateOccurrence {
            list_id,
            list_name: format!("List {}", list_id),
            warehouse: "North".to_string(),
            scan_id,
            identifier: identifier.to_string(),
            scanned_at: Utc::now(),
        }
    }

    #[test]
    fn repeats_within_one_list_are_not_duplicates() {
        let groups = group_across_lists(
            vec![occurrence(1, 1, "AB1"), occurrence(1, 2, "ab1")],
            &DEFAULT_KNOWN_PREFIXES,
        );
        assert!(groups.is_empty());
    }

    #[test]
    fn url_and_short_forms_group_together() {
        let groups = group_across_lists(
            vec![
                occurrence(2, 3, "https://tier.app/ab1"),
                occurrence(1, 1, "AB1"),
                occurrence(1, 2, "ZZ9"),
            ],
            &DEFAULT_KNOWN_PREFIXES,
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].identifier, "AB1");
        assert_eq!(groups[0].list_count(), 2);
        assert_eq!(groups[0].occurrences[0].list_id, 1);
        assert_eq!(groups[0].occurrences[1].list_id, 2);
    }

    #[test]
    fn groups_are_sorted_by_identifier() {
        let groups = group_across_lists(
            vec![
                occurrence(1, 1, "ZZ"),
                occurrence(2, 2, "ZZ"),
                occurrence(1, 3, "AA"),
                occurrence(3, 4, "AA"),
            ],
            &DEFAULT_KNOWN_PREFIXES,
        );
        let ids: Vec<&str> = groups.iter().map(|g| g.identifier.as_str()).collect();
        assert_eq!(ids, vec!["AA", "ZZ"]);
    }

    #[test]
    fn bare_prefixes_are_ignored() {
        let groups = group_across_lists(
            vec![
                occurrence(1, 1, "https://tier.app/"),
                occurrence(2, 2, "https://tier.app/"),
            ],
            &DEFAULT_KNOWN_PREFIXES,
        );
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn duplicates_can_be_limited_to_a_warehouse() {
        let ctx = TestContext::new().await;
        let a = ctx.scooter_list("A", "North").await;
        let b = ctx.scooter_list("B", "North").await;
        let c = ctx.scooter_list("C", "South").await;
        ctx.scanning.record_scan(a.id, "AB1").await.unwrap();
        ctx.scanning.record_scan(b.id, "https://tier.app/ab1").await.unwrap();
        ctx.scanning.record_scan(c.id, "CD2").await.unwrap();
        ctx.scanning.record_scan(a.id, "CD2").await.unwrap();

        let all = ctx.duplicates.find_duplicates(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let north = ctx.duplicates.find_duplicates(Some("North")).await.unwrap();
        assert_eq!(north.len(), 1);
        assert_eq!(north[0].identifier, "AB1");

        let south = ctx.duplicates.find_duplicates(Some("South")).await.unwrap();
        assert!(south.is_empty());
    }
}
