use async_trait::async_trait;

use crate::error::AppError;
use crate::models::backup::{BackupMode, BackupRow};

pub enum RegisterOutcome {
    Registered,
    AlreadyExists,
}

/// Storage seam for the account registry, the backup store and the
/// rate-limit log. Handlers only ever see this trait; the concrete pool is
/// injected by `main` (and by tests, over `sqlite::memory:`).
///
/// Accounts are permanent: the trait deliberately exposes no way to update
/// or delete a registered identity key. Only its backup row is erasable.
#[async_trait]
pub trait BackupRepository: Send + Sync {
    /// Insert the identity key unless present. The uniqueness constraint is
    /// the collision guard for the account-number generator.
    async fn register_account(&self, identity_key: &str) -> Result<RegisterOutcome, AppError>;
    async fn account_exists(&self, identity_key: &str) -> Result<bool, AppError>;

    /// Replace the single backup row for this identity as one conflict-
    /// resolving write. Callers have already validated the payload.
    async fn replace_backup(
        &self,
        identity_key: &str,
        payload: &str,
        mode: BackupMode,
    ) -> Result<(), AppError>;
    async fn latest_backup(&self, identity_key: &str) -> Result<Option<BackupRow>, AppError>;
    /// In-place payload rewrite used by entry deletion. The row keeps its
    /// mode and creation time; an empty entry list stays a live row.
    async fn update_backup_payload(
        &self,
        identity_key: &str,
        payload: &str,
    ) -> Result<(), AppError>;
    /// Remove the backup row entirely. Returns whether a row existed.
    async fn delete_backup(&self, identity_key: &str) -> Result<bool, AppError>;

    /// One sliding-window admission check against the persisted log:
    /// prune everything older than `window_start`, count this caller's
    /// events in the window, and record the event only when under
    /// `max_requests`. Returns whether the request is admitted. Rejected
    /// attempts are not recorded and do not consume quota.
    async fn admit_rate_event(
        &self,
        client_addr: &str,
        endpoint: &str,
        now: i64,
        window_start: i64,
        max_requests: i64,
    ) -> Result<bool, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
