use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use tracing::warn;

use crate::domain::error::{AppError, Result};
use crate::domain::scan_list::{ListKind, ListSummary, ScanList};

pub struct ListRepository {
    pool: SqlitePool,
}

impl ListRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert_list(
        &self,
        name: &str,
        warehouse: &str,
        kind: ListKind,
        created_at: DateTime<Utc>,
    ) -> Result<ScanList> {
        let result = sqlx::query(
            "INSERT INTO lists (name, warehouse, kind, created_at, is_validated)
             VALUES (?, ?, ?, ?, 0)",
        )
        .bind(name)
        .bind(warehouse)
        .bind(kind.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert list: {e}")))?;

        Ok(ScanList {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            warehouse: warehouse.to_string(),
            kind,
            created_at,
            is_validated: false,
            validation_timestamp: None,
        })
    }

    pub async fn get_list(&self, list_id: i64) -> Result<ScanList> {
        let list = sqlx::query_as::<_, ScanListEntity>(
            "SELECT id, name, warehouse, kind, created_at, is_validated, validation_timestamp
             FROM lists WHERE id = ?",
        )
        .bind(list_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch list: {e}")))?;

        match list {
            Some(list) => Ok(list.into()),
            None => Err(AppError::NotFound(format!("List not found: {}", list_id))),
        }
    }

    pub async fn list_summaries(&self, warehouse: Option<&str>) -> Result<Vec<ListSummary>> {
        let summaries = sqlx::query_as::<_, ListSummaryEntity>(
            "SELECT l.id, l.name, l.warehouse, l.kind, l.created_at, l.is_validated,
                    l.validation_timestamp,
                    (SELECT COUNT(*) FROM scans s WHERE s.list_id = l.id) AS scan_count,
                    (SELECT COUNT(*) FROM validations v WHERE v.list_id = l.id) AS validated_count
             FROM lists l
             WHERE (?1 IS NULL OR l.warehouse = ?1)
             ORDER BY l.created_at DESC, l.id DESC",
        )
        .bind(warehouse)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list lists: {e}")))?;

        Ok(summaries.into_iter().map(|summary| summary.into()).collect())
    }

    pub async fn list_warehouses(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT warehouse FROM lists ORDER BY warehouse")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to list warehouses: {e}")))?;
        Ok(rows.into_iter().map(|(warehouse,)| warehouse).collect())
    }

    pub async fn update_list(&self, list_id: i64, name: &str, warehouse: &str) -> Result<ScanList> {
        let result = sqlx::query("UPDATE lists SET name = ?, warehouse = ? WHERE id = ?")
            .bind(name)
            .bind(warehouse)
            .bind(list_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to update list: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("List not found: {}", list_id)));
        }
        self.get_list(list_id).await
    }

    pub async fn set_validated(
        &self,
        list_id: i64,
        validation_timestamp: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE lists SET is_validated = ?, validation_timestamp = ? WHERE id = ?",
        )
        .bind(validation_timestamp.is_some())
        .bind(validation_timestamp)
        .bind(list_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update validation state: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("List not found: {}", list_id)));
        }
        Ok(())
    }

    pub async fn delete_list(&self, list_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM lists WHERE id = ?")
            .bind(list_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete list: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("List not found: {}", list_id)));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ScanListEntity {
    id: i64,
    name: String,
    warehouse: String,
    kind: String,
    created_at: DateTime<Utc>,
    is_validated: bool,
    validation_timestamp: Option<DateTime<Utc>>,
}

impl From<ScanListEntity> for ScanList {
    fn from(entity: ScanListEntity) -> Self {
        let kind = entity.kind.parse().unwrap_or_else(|_| {
            warn!(list_id = entity.id, kind = %entity.kind, "Unknown list kind in database, treating as scooter");
            ListKind::Scooter
        });
        Self {
            id: entity.id,
            name: entity.name,
            warehouse: entity.warehouse,
            kind,
            created_at: entity.created_at,
            is_validated: entity.is_validated,
            validation_timestamp: entity.validation_timestamp,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ListSummaryEntity {
    #[sqlx(flatten)]
    list: ScanListEntity,
    scan_count: i64,
    validated_count: i64,
}

impl From<ListSummaryEntity> for ListSummary {
    fn from(entity: ListSummaryEntity) -> Self {
        Self {
            list: entity.list.into(),
            scan_count: entity.scan_count,
            validated_count: entity.validated_count,
        }
    }
}
