//! Cleaned CDR repository implementation
//!
//! Stores cleaned records in `cdr_records`. A record whose start time, ANI,
//! DNIS, duration and price match a stored row (nulls compared as equal) is
//! skipped, so re-running a day's file does not duplicate billing rows.
//! Uses runtime queries (not compile-time macros) to avoid requiring
//! database connection at build time.

use async_trait::async_trait;
use cdr_core::{models::CleanedCdrRecord, traits::CdrSink, AppError, AppResult};
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS cdr_records (
        id BIGSERIAL PRIMARY KEY,
        batch_id TEXT NOT NULL,
        start_time TIMESTAMPTZ,
        bill_duration BIGINT NOT NULL,
        call_price NUMERIC(14, 6) NOT NULL,
        ani VARCHAR(10),
        dnis VARCHAR(10),
        customer_ip TEXT NOT NULL,
        call_type TEXT NOT NULL,
        lrn TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_cdr_records_start_time ON cdr_records (start_time)";

const INSERT_IF_NEW: &str = r#"
    INSERT INTO cdr_records (
        batch_id, start_time, bill_duration, call_price,
        ani, dnis, customer_ip, call_type, lrn
    )
    SELECT $1::text, $2::timestamptz, $3::bigint, $4::numeric,
           $5::varchar, $6::varchar, $7::text, $8::text, $9::text
    WHERE NOT EXISTS (
        SELECT 1 FROM cdr_records
        WHERE start_time IS NOT DISTINCT FROM $2::timestamptz
          AND bill_duration = $3::bigint
          AND call_price = $4::numeric
          AND ani IS NOT DISTINCT FROM $5::varchar
          AND dnis IS NOT DISTINCT FROM $6::varchar
    )
"#;

/// PostgreSQL sink for cleaned CDR records
#[derive(Debug, Clone)]
pub struct PgCdrRepository {
    pool: PgPool,
}

impl PgCdrRepository {
    /// Create a new CDR repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create `cdr_records` and its index if they do not exist
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> AppResult<()> {
        for statement in [CREATE_TABLE, CREATE_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to create cdr_records schema: {}", e);
                    AppError::Database(format!("Failed to create schema: {}", e))
                })?;
        }

        debug!("cdr_records schema ready");
        Ok(())
    }
}

#[async_trait]
impl CdrSink for PgCdrRepository {
    fn name(&self) -> &str {
        "postgres"
    }

    /// Insert the batch in one transaction, skipping records already present
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn store(&self, batch_id: &str, records: &[CleanedCdrRecord]) -> AppResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Database(format!("Failed to start transaction: {}", e))
        })?;

        let mut inserted = 0u64;

        for record in records {
            let result = sqlx::query(INSERT_IF_NEW)
                .bind(batch_id)
                .bind(record.start_time)
                .bind(record.bill_duration)
                .bind(record.call_price)
                .bind(&record.ani)
                .bind(&record.dnis)
                .bind(&record.customer_ip)
                .bind(&record.call_type)
                .bind(&record.lrn)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    error!("Database error inserting CDR: {}", e);
                    AppError::Database(format!("Failed to insert CDR: {}", e))
                })?;

            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Database(format!("Failed to commit transaction: {}", e))
        })?;

        let skipped = records.len() as u64 - inserted;
        if skipped > 0 {
            info!("Skipped {} records already stored", skipped);
        }
        debug!("Inserted {} CDRs for batch {}", inserted, batch_id);

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_pool;
    use chrono::{DateTime, Utc};
    use rust_decimal_macros::dec;

    async fn repository() -> PgCdrRepository {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/cdr_ingest".to_string());
        let pool = create_pool(&database_url, 2).await.unwrap();
        let repo = PgCdrRepository::new(pool);
        repo.ensure_schema().await.unwrap();
        repo
    }

    /// A call starting at a fresh instant, so runs do not collide
    fn record(start_time: DateTime<Utc>) -> CleanedCdrRecord {
        CleanedCdrRecord {
            start_time: Some(start_time),
            bill_duration: 60,
            call_price: dec!(0.05),
            ani: Some("5551234567".to_string()),
            dnis: None,
            customer_ip: "10.0.0.1".to_string(),
            call_type: "outbound".to_string(),
            lrn: "5550000000".to_string(),
        }
    }

    fn unique_start() -> DateTime<Utc> {
        DateTime::from_timestamp_micros(Utc::now().timestamp_micros()).unwrap()
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_store_skips_duplicates() {
        let repo = repository().await;
        let start = unique_start();
        let records = vec![record(start), record(start)];

        let first = repo.store("batch-a", &records).await.unwrap();
        assert_eq!(first, 1);

        let again = repo.store("batch-b", &records[..1]).await.unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_duplicates_ignore_trunk_fields() {
        let repo = repository().await;
        let start = unique_start();

        let original = record(start);
        let other_lrn = CleanedCdrRecord {
            lrn: "5559999999".to_string(),
            ..original.clone()
        };
        let other_trunk = CleanedCdrRecord {
            customer_ip: "10.9.9.9".to_string(),
            call_type: "inbound".to_string(),
            ..original.clone()
        };

        assert_eq!(repo.store("batch-a", &[original]).await.unwrap(), 1);
        assert_eq!(repo.store("batch-b", &[other_lrn]).await.unwrap(), 0);
        assert_eq!(repo.store("batch-c", &[other_trunk]).await.unwrap(), 0);
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_different_call_is_stored() {
        let repo = repository().await;
        let start = unique_start();

        let first = record(start);
        let second = CleanedCdrRecord {
            dnis: Some("911".to_string()),
            ..first.clone()
        };

        assert_eq!(repo.store("batch-a", &[first, second]).await.unwrap(), 2);
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_store_empty_batch() {
        let repo = repository().await;
        assert_eq!(repo.store("empty", &[]).await.unwrap(), 0);
    }
}
