//! Postgres case store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use sqlx::PgPool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

use super::{CaseStore, StoreError};
use crate::case::model::{Case, CasePatch, CaseStatus, NewCase};

const CASE_LIST_CACHE_KEY: &str = "service_cases";
const DEFAULT_LIST_CACHE_TTL: Duration = Duration::from_secs(60);

const CASE_COLUMNS: &str = "id, case_number, reference, client_name, client_tax_id, phone, notes, \
     intake_at, delivered_at, status, status_changed_at, resolution_note, process_note";

#[derive(Debug, sqlx::FromRow)]
struct CaseRow {
    id: Uuid,
    case_number: i64,
    reference: String,
    client_name: String,
    client_tax_id: String,
    phone: String,
    notes: Option<String>,
    intake_at: DateTime<Utc>,
    delivered_at: Option<DateTime<Utc>>,
    status: String,
    status_changed_at: DateTime<Utc>,
    resolution_note: Option<String>,
    process_note: Option<String>,
}

impl TryFrom<CaseRow> for Case {
    type Error = StoreError;

    fn try_from(row: CaseRow) -> Result<Self, Self::Error> {
        let status: CaseStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("case {}: {}", row.id, e)))?;

        Ok(Case {
            id: row.id,
            case_number: row.case_number,
            reference: row.reference,
            client_name: row.client_name,
            client_tax_id: row.client_tax_id,
            phone: row.phone,
            notes: row.notes,
            intake_at: row.intake_at,
            delivered_at: row.delivered_at,
            status,
            status_changed_at: row.status_changed_at,
            resolution_note: row.resolution_note,
            process_note: row.process_note,
        })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_) => StoreError::Corrupt(err.to_string()),
            _ => StoreError::Rejected(err.to_string()),
        }
    }
}

/// Listing snapshot cache. Every write bumps `generation`; a snapshot read
/// before a write is never kept.
struct ListCache {
    cache: Cache<String, Vec<Case>>,
    generation: AtomicU64,
}

impl ListCache {
    fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(ttl).max_capacity(1).build(),
            generation: AtomicU64::new(0),
        }
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    async fn get(&self) -> Option<Vec<Case>> {
        self.cache.get(CASE_LIST_CACHE_KEY).await
    }

    /// Keep `cases`, read after observing `generation`, unless a write has
    /// landed since.
    async fn fill(&self, generation: u64, cases: Vec<Case>) {
        if self.generation() != generation {
            return;
        }
        self.cache.insert(CASE_LIST_CACHE_KEY.to_string(), cases).await;
        // A write between the check and the insert must not leave it behind.
        if self.generation() != generation {
            self.cache.invalidate(CASE_LIST_CACHE_KEY).await;
        }
    }

    async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate(CASE_LIST_CACHE_KEY).await;
    }
}

pub struct PgCaseStore {
    pool: PgPool,
    list_cache: Option<ListCache>,
}

impl PgCaseStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_list_cache_ttl(pool, DEFAULT_LIST_CACHE_TTL)
    }

    /// A zero `ttl` turns the listing cache off, so every list reads the
    /// database. Needed when several instances share one database.
    pub fn with_list_cache_ttl(pool: PgPool, ttl: Duration) -> Self {
        let list_cache = (!ttl.is_zero()).then(|| ListCache::new(ttl));
        Self { pool, list_cache }
    }

    async fn invalidate_list(&self) {
        if let Some(cache) = &self.list_cache {
            cache.invalidate().await;
        }
    }
}

#[async_trait]
impl CaseStore for PgCaseStore {
    async fn list(&self) -> Result<Vec<Case>, StoreError> {
        let generation = match &self.list_cache {
            Some(cache) => {
                if let Some(cached) = cache.get().await {
                    log::debug!("Serving {} cases from list cache", cached.len());
                    return Ok(cached);
                }
                Some(cache.generation())
            }
            None => None,
        };

        let rows = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {} FROM service_cases ORDER BY intake_at DESC, case_number DESC",
            CASE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let cases = rows
            .into_iter()
            .map(Case::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        if let (Some(cache), Some(generation)) = (&self.list_cache, generation) {
            cache.fill(generation, cases.clone()).await;
        }
        Ok(cases)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Case>, StoreError> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {} FROM service_cases WHERE id = $1",
            CASE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Case::try_from).transpose()
    }

    // Read-then-insert: two concurrent creators can compute the same number.
    // The UNIQUE constraint on case_number turns the loser into a Rejected write.
    async fn create(&self, new_case: NewCase) -> Result<Case, StoreError> {
        let mut tx = self.pool.begin().await?;

        let case_number: i64 = sqlx::query_scalar(
            r#"
            SELECT GREATEST(
                COALESCE((SELECT MAX(case_number) FROM service_cases), 0),
                COALESCE((SELECT last_number FROM case_number_watermark WHERE id = 1), 0)
            ) + 1
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, CaseRow>(&format!(
            r#"
            INSERT INTO service_cases
                (id, case_number, reference, client_name, client_tax_id, phone, notes,
                 intake_at, status, status_changed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), $8, NOW())
            RETURNING {}
            "#,
            CASE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(case_number)
        .bind(&new_case.reference)
        .bind(&new_case.client_name)
        .bind(&new_case.client_tax_id)
        .bind(&new_case.phone)
        .bind(new_case.notes.as_deref())
        .bind(CaseStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO case_number_watermark (id, last_number) VALUES (1, $1)
            ON CONFLICT (id) DO UPDATE
            SET last_number = GREATEST(case_number_watermark.last_number, EXCLUDED.last_number)
            "#,
        )
        .bind(case_number)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.invalidate_list().await;

        Case::try_from(row)
    }

    async fn update(&self, id: &Uuid, patch: CasePatch) -> Result<Option<Case>, StoreError> {
        let notes_provided = patch.notes.is_some();
        let notes = patch.notes.flatten();

        let row = sqlx::query_as::<_, CaseRow>(&format!(
            r#"
            UPDATE service_cases SET
                reference = COALESCE($2, reference),
                client_name = COALESCE($3, client_name),
                client_tax_id = COALESCE($4, client_tax_id),
                phone = COALESCE($5, phone),
                notes = CASE WHEN $6 THEN $7 ELSE notes END,
                status = COALESCE($8, status),
                status_changed_at = COALESCE($9, status_changed_at),
                delivered_at = COALESCE($10, delivered_at),
                process_note = COALESCE($11, process_note),
                resolution_note = COALESCE($12, resolution_note)
            WHERE id = $1
            RETURNING {}
            "#,
            CASE_COLUMNS
        ))
        .bind(id)
        .bind(patch.reference)
        .bind(patch.client_name)
        .bind(patch.client_tax_id)
        .bind(patch.phone)
        .bind(notes_provided)
        .bind(notes)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.status_changed_at)
        .bind(patch.delivered_at)
        .bind(patch.process_note)
        .bind(patch.resolution_note)
        .fetch_optional(&self.pool)
        .await?;

        self.invalidate_list().await;
        row.map(Case::try_from).transpose()
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM service_cases WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.invalidate_list().await;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(status: &str) -> CaseRow {
        let now = Utc::now();
        CaseRow {
            id: Uuid::new_v4(),
            case_number: 3,
            reference: "Epson L3150".to_string(),
            client_name: "Luis Gómez".to_string(),
            client_tax_id: "900123".to_string(),
            phone: "3100000000".to_string(),
            notes: None,
            intake_at: now,
            delivered_at: None,
            status: status.to_string(),
            status_changed_at: now,
            resolution_note: None,
            process_note: None,
        }
    }

    #[test]
    fn test_row_with_known_status_converts() {
        let case = Case::try_from(sample_row("in_progress")).unwrap();
        assert_eq!(case.status, CaseStatus::InProgress);
        assert_eq!(case.case_number, 3);
    }

    #[test]
    fn test_row_with_unknown_status_is_corrupt() {
        let err = Case::try_from(sample_row("closed")).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_list_snapshot_read_before_a_write_is_not_cached() {
        let cache = ListCache::new(Duration::from_secs(60));
        let case = Case::try_from(sample_row("pending")).unwrap();

        // SELECT starts, a create commits and invalidates, then the SELECT returns.
        let seen = cache.generation();
        cache.invalidate().await;
        cache.fill(seen, Vec::new()).await;
        assert!(cache.get().await.is_none());

        let seen = cache.generation();
        cache.fill(seen, vec![case]).await;
        assert_eq!(cache.get().await.map(|cases| cases.len()), Some(1));

        cache.invalidate().await;
        assert!(cache.get().await.is_none());
    }

    #[test]
    fn test_pool_timeout_is_unavailable() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Rejected(_)
        ));
    }
}
