use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::domain::identifier::normalize;
use crate::domain::scan::ScanEntry;
use crate::domain::scan_list::{ListDetail, ListKind, ListLabel, ListSummary, ScanList};
use crate::infrastructure::db::lists::ListRepository;
use crate::infrastructure::db::scans::ScanRepository;

use super::KnownPrefixes;

pub struct ListUseCase {
    lists: Arc<ListRepository>,
    scans: Arc<ScanRepository>,
    prefixes: KnownPrefixes,
}

impl ListUseCase {
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

    pub async fn create_list(&self, name: &str, warehouse: &str, kind: ListKind) -> Result<ScanList> {
        let label = ListLabel::new(name, warehouse);
        label.validate()?;

        let list = self
            .lists
            .insert_list(&label.name, &label.warehouse, kind, Utc::now())
            .await?;
        info!(
            list_id = list.id,
            name = %list.name,
            warehouse = %list.warehouse,
            kind = %list.kind,
            "Created scan list"
        );
        Ok(list)
    }

    pub async fn list_lists(&self, warehouse: Option<&str>) -> Result<Vec<ListSummary>> {
        let warehouse = warehouse.map(str::trim).filter(|w| !w.is_empty());
        self.lists.list_summaries(warehouse).await
    }

    pub async fn list_warehouses(&self) -> Result<Vec<String>> {
        self.lists.list_warehouses().await
    }

    /// The list with its entries, newest scan first.
    pub async fn get_detail(&self, list_id: i64) -> Result<ListDetail> {
        let list = self.lists.get_list(list_id).await?;
        let rows = self.scans.list_scan_rows(list_id).await?;

        let mut entries: Vec<ScanEntry> = rows
            .into_iter()
            .map(|row| ScanEntry {
                short_id: normalize(&row.scan.identifier, self.prefixes.as_slice()),
                validated_at: row.validated_at,
                scan: row.scan,
            })
            .collect();
        entries.reverse();
        let validated_count = entries.iter().filter(|e| e.is_validated()).count() as i64;

        Ok(ListDetail {
            list,
            entries,
            validated_count,
        })
    }

    pub async fn update_list(
        &self,
        list_id: i64,
        name: Option<&str>,
        warehouse: Option<&str>,
    ) -> Result<ScanList> {
        if name.is_none() && warehouse.is_none() {
            return Err(AppError::ValidationError(
                "Nothing to update: provide a name or a warehouse.".to_string(),
            ));
        }
        let current = self.lists.get_list(list_id).await?;
        let label = ListLabel::new(
            name.unwrap_or(&current.name),
            warehouse.unwrap_or(&current.warehouse),
        );
        label.validate()?;

        let updated = self
            .lists
            .update_list(list_id, &label.name, &label.warehouse)
            .await?;
        info!(list_id, name = %updated.name, warehouse = %updated.warehouse, "Updated scan list");
        Ok(updated)
    }

    pub async fn delete_list(&self, list_id: i64) -> Result<()> {
        self.lists.delete_list(list_id).await?;
        info!(list_id, "Deleted scan list");
        Ok(())
    }
}
