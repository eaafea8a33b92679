use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::backup::{BackupMode, BackupRow};
use crate::repository::{BackupRepository, RegisterOutcome};
use crate::util::{key_prefix, now_secs};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl BackupRepository for SqliteRepository {
    async fn register_account(&self, identity_key: &str) -> Result<RegisterOutcome, AppError> {
        let prefix = key_prefix(identity_key);
        tracing::debug!(identity_key = %prefix, "db: INSERT accounts");

        let result = sqlx::query("INSERT INTO accounts (identity_key, created_at) VALUES (?, ?)")
            .bind(identity_key)
            .bind(now_secs())
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {
                tracing::debug!(identity_key = %prefix, "db: account row inserted");
                Ok(RegisterOutcome::Registered)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                tracing::debug!(identity_key = %prefix, "db: identity key already registered");
                Ok(RegisterOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn account_exists(&self, identity_key: &str) -> Result<bool, AppError> {
        let prefix = key_prefix(identity_key);
        tracing::debug!(identity_key = %prefix, "db: SELECT 1 (account exists check)");

        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM accounts WHERE identity_key = ?")
                .bind(identity_key)
                .fetch_optional(&self.pool)
                .await?;

        let found = exists.is_some();
        tracing::debug!(identity_key = %prefix, found, "db: account exists result");

        Ok(found)
    }

    async fn replace_backup(
        &self,
        identity_key: &str,
        payload: &str,
        mode: BackupMode,
    ) -> Result<(), AppError> {
        let prefix = key_prefix(identity_key);
        tracing::debug!(
            identity_key = %prefix,
            payload_bytes = payload.len(),
            ?mode,
            "db: upsert backup row"
        );

        sqlx::query(
            "INSERT INTO backups (identity_key, payload, mode, created_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT (identity_key) DO UPDATE SET \
               payload = excluded.payload, \
               mode = excluded.mode, \
               created_at = excluded.created_at",
        )
        .bind(identity_key)
        .bind(payload)
        .bind(mode)
        .bind(now_secs())
        .execute(&self.pool)
        .await?;

        tracing::debug!(identity_key = %prefix, "db: backup row replaced");

        Ok(())
    }

    async fn latest_backup(&self, identity_key: &str) -> Result<Option<BackupRow>, AppError> {
        let prefix = key_prefix(identity_key);
        tracing::debug!(identity_key = %prefix, "db: SELECT latest backup");

        let row: Option<BackupRow> = sqlx::query_as(
            "SELECT payload, mode, created_at FROM backups \
             WHERE identity_key = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(identity_key)
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!(identity_key = %prefix, found = row.is_some(), "db: backup lookup result");

        Ok(row)
    }

    async fn update_backup_payload(
        &self,
        identity_key: &str,
        payload: &str,
    ) -> Result<(), AppError> {
        let prefix = key_prefix(identity_key);
        tracing::debug!(
            identity_key = %prefix,
            payload_bytes = payload.len(),
            "db: UPDATE backup payload in place"
        );

        sqlx::query("UPDATE backups SET payload = ? WHERE identity_key = ?")
            .bind(payload)
            .bind(identity_key)
            .execute(&self.pool)
            .await?;

        tracing::debug!(identity_key = %prefix, "db: backup payload updated");

        Ok(())
    }

    async fn delete_backup(&self, identity_key: &str) -> Result<bool, AppError> {
        let prefix = key_prefix(identity_key);
        tracing::debug!(identity_key = %prefix, "db: DELETE backup row");

        let result = sqlx::query("DELETE FROM backups WHERE identity_key = ?")
            .bind(identity_key)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        tracing::debug!(
            identity_key = %prefix,
            rows_affected = result.rows_affected(),
            deleted,
            "db: backup delete result"
        );

        Ok(deleted)
    }

    async fn admit_rate_event(
        &self,
        client_addr: &str,
        endpoint: &str,
        now: i64,
        window_start: i64,
        max_requests: i64,
    ) -> Result<bool, AppError> {
        tracing::debug!(client_addr, endpoint, window_start, "db: rate limit check");

        let mut tx = self.pool.begin().await?;

        // Global prune, not scoped to this caller: every check amortizes
        // cleanup for the whole log.
        sqlx::query("DELETE FROM rate_limit_events WHERE timestamp < ?")
            .bind(window_start)
            .execute(&mut *tx)
            .await?;

        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM rate_limit_events \
             WHERE client_addr = ? AND endpoint = ? AND timestamp >= ?",
        )
        .bind(client_addr)
        .bind(endpoint)
        .bind(window_start)
        .fetch_one(&mut *tx)
        .await?;

        if count >= max_requests {
            // Rejected attempts are not logged and never consume quota.
            tx.commit().await?;
            tracing::debug!(client_addr, endpoint, count, "db: rate limit exceeded");
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO rate_limit_events (client_addr, endpoint, timestamp) VALUES (?, ?, ?)",
        )
        .bind(client_addr)
        .bind(endpoint)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(client_addr, endpoint, count = count + 1, "db: request admitted");

        Ok(true)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
