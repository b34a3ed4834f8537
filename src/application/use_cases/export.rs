use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::domain::error::Result;
use crate::domain::identifier::normalize;
use crate::infrastructure::db::lists::ListRepository;
use crate::infrastructure::db::scans::ScanRepository;
use crate::infrastructure::export::{self, sanitize_filename, ExportFile, ExportFormat, Sheet};

use super::duplicates::DuplicateUseCase;
use super::KnownPrefixes;

pub const SCAN_TIMESTAMP_FORMAT: &str = "%H:%M | %d.%m.%Y";
const FILENAME_STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

pub struct ExportUseCase {
    lists: Arc<ListRepository>,
    scans: Arc<ScanRepository>,
    duplicates: Arc<DuplicateUseCase>,
    prefixes: KnownPrefixes,
}

impl ExportUseCase {
    pub fn new(
        lists: Arc<ListRepository>,
        scans: Arc<ScanRepository>,
        duplicates: Arc<DuplicateUseCase>,
        prefixes: KnownPrefixes,
    ) -> Self {
        Self {
            lists,
            scans,
            duplicates,
            prefixes,
        }
    }

    pub async fn export_list(&self, list_id: i64, format: ExportFormat) -> Result<ExportFile> {
        let list = self.lists.get_list(list_id).await?;
        let rows = self.scans.list_scan_rows(list_id).await?;

        let mut sheet = Sheet::new(
            &list.name,
            &[
                list.kind.id_label(),
                "Short ID",
                "Timestamp",
                "Validated",
                "Validated At",
            ],
        );
        for row in &rows {
            sheet.push_row(vec![
                row.scan.identifier.clone(),
                normalize(&row.scan.identifier, self.prefixes.as_slice()),
                format_timestamp(row.scan.scanned_at),
                if row.validated_at.is_some() { "Yes" } else { "No" }.to_string(),
                row.validated_at.map(format_timestamp).unwrap_or_default(),
            ]);
        }

        let bytes = export::render(&sheet, format)?;
        let filename = format!(
            "{}_{}_{}.{}",
            sanitize_filename(&list.name),
            sanitize_filename(&list.warehouse),
            Local::now().format(FILENAME_STAMP_FORMAT),
            format.extension()
        );
        info!(
            list_id,
            rows = rows.len(),
            filename = %filename,
            "List exported"
        );
        Ok(ExportFile {
            filename,
            format,
            bytes,
        })
    }

    pub async fn export_duplicates(&self, warehouse: Option<&str>) -> Result<ExportFile> {
        let groups = self.duplicates.find_duplicates(warehouse).await?;

        let mut sheet = Sheet::new(
            "Duplicates",
            &["Identifier", "Scanned As", "List", "Warehouse", "Timestamp"],
        );
        for group in &groups {
            for occurrence in &group.occurrences {
                sheet.push_row(vec![
                    group.identifier.clone(),
                    occurrence.identifier.clone(),
                    occurrence.list_name.clone(),
                    occurrence.warehouse.clone(),
                    format_timestamp(occurrence.scanned_at),
                ]);
            }
        }

        let format = ExportFormat::Xlsx;
        let bytes = export::render(&sheet, format)?;
        let scope = warehouse
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(sanitize_filename)
            .unwrap_or_else(|| "all".to_string());
        let filename = format!(
            "duplicates_{}_{}.{}",
            scope,
            Local::now().format(FILENAME_STAMP_FORMAT),
            format.extension()
        );
        info!(groups = groups.len(), filename = %filename, "Duplicates exported");
        Ok(ExportFile {
            filename,
            format,
            bytes,
        })
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    format_timestamp_in(at, &Local)
}

pub fn format_timestamp_in<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    at.with_timezone(tz).format(SCAN_TIMESTAMP_FORMAT).to_string()
}
