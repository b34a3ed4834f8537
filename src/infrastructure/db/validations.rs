use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;

use crate::domain::error::{AppError, Result};
use crate::domain::scan::Validation;

pub struct ValidationRepository {
    pool: SqlitePool,
}

impl ValidationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns `None` when the scan already has a validation.
    pub async fn insert_validation(
        &self,
        list_id: i64,
        scan_id: i64,
        identifier: &str,
        validated_at: DateTime<Utc>,
    ) -> Result<Option<Validation>> {
        let result = sqlx::query(
            "INSERT INTO validations (list_id, scan_id, identifier, validated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(scan_id) DO NOTHING",
        )
        .bind(list_id)
        .bind(scan_id)
        .bind(identifier)
        .bind(validated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert validation: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(Validation {
            id: result.last_insert_rowid(),
            list_id,
            scan_id,
            identifier: identifier.to_string(),
            validated_at,
        }))
    }

    pub async fn count_validated(&self, list_id: i64) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM validations WHERE list_id = ?")
                .bind(list_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to count validations: {e}")))?;
        Ok(count)
    }

    pub async fn list_validations(&self, list_id: i64) -> Result<Vec<Validation>> {
        let validations = sqlx::query_as::<_, ValidationEntity>(
            "SELECT id, list_id, scan_id, identifier, validated_at FROM validations
             WHERE list_id = ? ORDER BY validated_at ASC, id ASC",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list validations: {e}")))?;

        Ok(validations.into_iter().map(|v| v.into()).collect())
    }

    /// Returns the number of validations removed.
    pub async fn delete_for_scan(&self, scan_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM validations WHERE scan_id = ?")
            .bind(scan_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete validation: {e}")))?;
        Ok(result.rows_affected())
    }

    pub async fn delete_for_list(&self, list_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM validations WHERE list_id = ?")
            .bind(list_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to reset validations: {e}")))?;
        Ok(result.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct ValidationEntity {
    id: i64,
    list_id: i64,
    scan_id: i64,
    identifier: String,
    validated_at: DateTime<Utc>,
}

impl From<ValidationEntity> for Validation {
    fn from(entity: ValidationEntity) -> Self {
        Self {
            id: entity.id,
            list_id: entity.list_id,
            scan_id: entity.scan_id,
            identifier: entity.identifier,
            validated_at: entity.validated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scan_list::ListKind;
    use crate::infrastructure::db::connection::init_memory_db;
    use crate::infrastructure::db::lists::ListRepository;
    use crate::infrastructure::db::scans::ScanRepository;

    struct Fixture {
        scans: ScanRepository,
        validations: ValidationRepository,
        list_id: i64,
    }

    async fn fixture() -> Fixture {
        let pool = init_memory_db().await.unwrap();
        let lists = ListRepository::new(pool.clone());
        let list = lists
            .insert_list("A", "North", ListKind::Scooter, Utc::now())
            .await
            .unwrap();
        Fixture {
            scans: ScanRepository::new(pool.clone()),
            validations: ValidationRepository::new(pool),
            list_id: list.id,
        }
    }

    #[tokio::test]
    async fn a_scan_can_only_be_validated_once() {
        let f = fixture().await;
        let scan = f.scans.insert_scan(f.list_id, "AB1", Utc::now()).await.unwrap();

        let first = f
            .validations
            .insert_validation(f.list_id, scan.id, "AB1", Utc::now())
            .await
            .unwrap();
        assert_eq!(first.map(|v| v.scan_id), Some(scan.id));
        let second = f
            .validations
            .insert_validation(f.list_id, scan.id, "AB1", Utc::now())
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(f.validations.count_validated(f.list_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn scan_rows_report_validation_time() {
        let f = fixture().await;
        let a = f.scans.insert_scan(f.list_id, "A1", Utc::now()).await.unwrap();
        f.scans.insert_scan(f.list_id, "B1", Utc::now()).await.unwrap();
        f.validations
            .insert_validation(f.list_id, a.id, "A1", Utc::now())
            .await
            .unwrap();

        let rows = f.scans.list_scan_rows(f.list_id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].validated_at.is_some());
        assert!(rows[1].validated_at.is_none());
    }

    #[tokio::test]
    async fn deleting_scan_removes_its_validation() {
        let f = fixture().await;
        let scan = f.scans.insert_scan(f.list_id, "A1", Utc::now()).await.unwrap();
        f.validations
            .insert_validation(f.list_id, scan.id, "A1", Utc::now())
            .await
            .unwrap();

        f.scans.delete_scan(f.list_id, scan.id).await.unwrap();
        assert_eq!(f.validations.count_validated(f.list_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_helpers_report_affected_rows() {
        let f = fixture().await;
        let a = f.scans.insert_scan(f.list_id, "A1", Utc::now()).await.unwrap();
        let b = f.scans.insert_scan(f.list_id, "B1", Utc::now()).await.unwrap();
        for scan in [&a, &b] {
            f.validations
                .insert_validation(f.list_id, scan.id, &scan.identifier, Utc::now())
                .await
                .unwrap();
        }

        assert_eq!(f.validations.delete_for_scan(a.id).await.unwrap(), 1);
        assert_eq!(f.validations.delete_for_scan(a.id).await.unwrap(), 0);
        assert_eq!(f.validations.list_validations(f.list_id).await.unwrap().len(), 1);
        assert_eq!(f.validations.delete_for_list(f.list_id).await.unwrap(), 1);
    }
}
