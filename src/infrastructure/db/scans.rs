use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;

use crate::domain::duplicate::DuplicateOccurrence;
use crate::domain::error::{AppError, Result};
use crate::domain::scan::Scan;

pub struct ScanRepository {
    pool: SqlitePool,
}

/// A scan joined with its validation, if any.
pub struct ScanRow {
    pub scan: Scan,
    pub validated_at: Option<DateTime<Utc>>,
}

impl ScanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert_scan(
        &self,
        list_id: i64,
        identifier: &str,
        scanned_at: DateTime<Utc>,
    ) -> Result<Scan> {
        let result = sqlx::query(
            "INSERT INTO scans (list_id, identifier, scanned_at) VALUES (?, ?, ?)",
        )
        .bind(list_id)
        .bind(identifier)
        .bind(scanned_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert scan: {e}")))?;

        Ok(Scan {
            id: result.last_insert_rowid(),
            list_id,
            identifier: identifier.to_string(),
            scanned_at,
        })
    }

    /// Inserts unless the list already holds a scan with the same `dedup_key`.
    /// Returns `None` when the key is taken.
    pub async fn insert_unique_scan(
        &self,
        list_id: i64,
        identifier: &str,
        dedup_key: &str,
        scanned_at: DateTime<Utc>,
    ) -> Result<Option<Scan>> {
        let result = sqlx::query(
            "INSERT INTO scans (list_id, identifier, dedup_key, scanned_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(list_id, dedup_key) DO NOTHING",
        )
        .bind(list_id)
        .bind(identifier)
        .bind(dedup_key)
        .bind(scanned_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert scan: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(Scan {
            id: result.last_insert_rowid(),
            list_id,
            identifier: identifier.to_string(),
            scanned_at,
        }))
    }

    pub async fn count_scans(&self, list_id: i64) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scans WHERE list_id = ?")
            .bind(list_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count scans: {e}")))?;
        Ok(count)
    }

    /// Scans of a list in the order they were recorded.
    pub async fn list_scans(&self, list_id: i64) -> Result<Vec<Scan>> {
        let scans = sqlx::query_as::<_, ScanEntity>(
            "SELECT id, list_id, identifier, scanned_at FROM scans
             WHERE list_id = ? ORDER BY scanned_at ASC, id ASC",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list scans: {e}")))?;

        Ok(scans.into_iter().map(|scan| scan.into()).collect())
    }

    pub async fn list_scan_rows(&self, list_id: i64) -> Result<Vec<ScanRow>> {
        let rows = sqlx::query_as::<_, ScanRowEntity>(
            "SELECT s.id, s.list_id, s.identifier, s.scanned_at, v.validated_at
             FROM scans s
             LEFT JOIN validations v ON v.scan_id = s.id
             WHERE s.list_id = ?
             ORDER BY s.scanned_at ASC, s.id ASC",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list scans: {e}")))?;

        Ok(rows.into_iter().map(|row| row.into()).collect())
    }

    /// Every scan joined with its list, optionally limited to one warehouse.
    pub async fn list_occurrences(&self, warehouse: Option<&str>) -> Result<Vec<DuplicateOccurrence>> {
        let rows = sqlx::query_as::<_, OccurrenceEntity>(
            "SELECT s.id AS scan_id, s.identifier, s.scanned_at,
                    l.id AS list_id, l.name AS list_name, l.warehouse
             FROM scans s
             JOIN lists l ON l.id = s.list_id
             WHERE (?1 IS NULL OR l.warehouse = ?1)
             ORDER BY l.id ASC, s.scanned_at ASC, s.id ASC",
        )
        .bind(warehouse)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list scan occurrences: {e}")))?;

        Ok(rows.into_iter().map(|row| row.into()).collect())
    }

    pub async fn delete_scan(&self, list_id: i64, scan_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM scans WHERE id = ? AND list_id = ?")
            .bind(scan_id)
            .bind(list_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete scan: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Scan {} not found in list {}",
                scan_id, list_id
            )));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ScanEntity {
    id: i64,
    list_id: i64,
    identifier: String,
    scanned_at: DateTime<Utc>,
}

impl From<ScanEntity> for Scan {
    fn from(entity: ScanEntity) -> Self {
        Self {
            id: entity.id,
            list_id: entity.list_id,
            identifier: entity.identifier,
            scanned_at: entity.scanned_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ScanRowEntity {
    #[sqlx(flatten)]
    scan: ScanEntity,
    validated_at: Option<DateTime<Utc>>,
}

impl From<ScanRowEntity> for ScanRow {
    fn from(entity: ScanRowEntity) -> Self {
        Self {
            scan: entity.scan.into(),
            validated_at: entity.validated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OccurrenceEntity {
    scan_id: i64,
    identifier: String,
    scanned_at: DateTime<Utc>,
    list_id: i64,
    list_name: String,
    warehouse: String,
}

impl From<OccurrenceEntity> for DuplicateOccurrence {
    fn from(entity: OccurrenceEntity) -> Self {
        Self {
            list_id: entity.list_id,
            list_name: entity.list_name,
            warehouse: entity.warehouse,
            scan_id: entity.scan_id,
            identifier: entity.identifier,
            scanned_at: entity.scanned_at,
        }
    }
}
