use crate::error::AppError;
use crate::repository::BackupRepository;
use crate::util::now_secs;

/// Sliding-window admission control over the persisted event log, keyed by
/// (client address, endpoint). Backed by storage rather than process memory
/// so the quota survives restarts and is shared across instances.
///
/// A storage failure propagates as an error and fails the protected
/// request: the limiter fails closed, never silently admitting.
#[derive(Clone)]
pub struct RateLimiter {
    max_requests: i64,
    window_seconds: i64,
}

impl RateLimiter {
    pub fn new(max_requests: i64, window_seconds: i64) -> Self {
        Self {
            max_requests,
            window_seconds,
        }
    }

    /// Returns whether this request is admitted. Admission records the
    /// event; rejection records nothing.
    pub async fn check(
        &self,
        repo: &dyn BackupRepository,
        client_addr: &str,
        endpoint: &str,
    ) -> Result<bool, AppError> {
        let now = now_secs();
        let window_start = now - self.window_seconds;

        let admitted = repo
            .admit_rate_event(client_addr, endpoint, now, window_start, self.max_requests)
            .await?;

        if !admitted {
            tracing::info!(
                client_addr,
                endpoint,
                max_requests = self.max_requests,
                window_seconds = self.window_seconds,
                "Rate limit exceeded"
            );
        }

        Ok(admitted)
    }
}
