pub mod account_number;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod repository;
pub mod sanitize;
pub mod sqlite_repo;
pub mod util;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use rate_limit::RateLimiter;
use repository::BackupRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn BackupRepository>,
    pub rate_limiter: RateLimiter,
}

/// Identifier minting and identifier guessing are the two abusable
/// operations; only they pass through the client-address resolver and the
/// persisted rate limiter.
fn rate_limited_routes() -> Router<AppState> {
    Router::new()
        .route("/api/create-account", post(handlers::accounts::create_account))
        .route("/api/verify-account", post(handlers::accounts::verify_account))
        .layer(axum_middleware::from_fn(
            middleware::client_addr::resolve_client_addr,
        ))
}

/// Backup-store operations authenticate by possession of a valid secret
/// number, so they carry no address-based quota.
fn backup_routes() -> Router<AppState> {
    Router::new()
        .route("/api/backup-accounts", post(handlers::backups::backup_accounts))
        .route("/api/restore-accounts", post(handlers::backups::restore_accounts))
        .route("/api/delete-account", post(handlers::backups::delete_entry))
        .route("/api/delete-user", delete(handlers::backups::delete_user))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health_check))
}

/// Build the full application router (used by main and tests).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(rate_limited_routes())
        .merge(backup_routes())
        .merge(health_routes())
        .with_state(state)
}
