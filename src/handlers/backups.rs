use axum::{extract::State, response::IntoResponse, Json};

use crate::account_number::{hash_account_number, is_valid_account_number};
use crate::error::AppError;
use crate::models::account::MessageResponse;
use crate::models::backup::{
    BackupMode, BackupRequest, DeleteEntryRequest, DeleteUserRequest, RestoreRequest,
    RestoreResponse, CIPHERTEXT_MARKER,
};
use crate::models::entry::{CredentialEntry, EntryId};
use crate::util::key_prefix;
use crate::AppState;

/// Resolve a presented account number to its identity key, distinguishing
/// the malformed case (400) from the well-formed-but-unregistered case
/// (401). Every backup-store operation goes through this first.
async fn resolve_registered_key(
    state: &AppState,
    account_number: &str,
) -> Result<String, AppError> {
    if !is_valid_account_number(account_number) {
        return Err(AppError::BadRequest("Invalid account number format".into()));
    }
    let identity_key = hash_account_number(account_number);
    if !state.repo.account_exists(&identity_key).await? {
        return Err(AppError::InvalidAccount);
    }
    Ok(identity_key)
}

/// POST /api/backup-accounts — store the single current backup, replacing
/// any previous one. Dual mode: opaque ciphertext (marker-prefixed) or a
/// plaintext entry array that is sanitized before storage.
pub async fn backup_accounts(
    State(state): State<AppState>,
    Json(body): Json<BackupRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(
        handler = "backup_accounts",
        encrypted = body.encrypted,
        "Handler: POST /api/backup-accounts"
    );

    let identity_key = resolve_registered_key(&state, &body.account_number).await?;

    let (payload, mode) = if body.encrypted {
        let ciphertext = body.accounts.as_str().ok_or_else(|| {
            AppError::BadRequest("Invalid encrypted accounts data - expected string".into())
        })?;
        if !ciphertext.starts_with(CIPHERTEXT_MARKER) {
            tracing::warn!(handler = "backup_accounts", "Validation failed: missing ciphertext marker");
            return Err(AppError::BadRequest("Invalid encrypted data format".into()));
        }
        // Opaque from here on: stored and served byte-for-byte.
        (ciphertext.to_string(), BackupMode::Encrypted)
    } else {
        let mut entries: Vec<CredentialEntry> = serde_json::from_value(body.accounts)
            .map_err(|_| AppError::BadRequest("Invalid accounts data".into()))?;
        if !entries.iter_mut().all(|e| e.sanitize_and_validate()) {
            tracing::warn!(handler = "backup_accounts", "Validation failed: unsanitizable entry");
            return Err(AppError::BadRequest("Invalid accounts data".into()));
        }
        let payload = serde_json::to_string(&entries)
            .map_err(|e| AppError::Internal(format!("payload serialization failed: {e}")))?;
        (payload, BackupMode::Plain)
    };

    tracing::debug!(handler = "backup_accounts", "Dispatching to repo.replace_backup");
    state.repo.replace_backup(&identity_key, &payload, mode).await?;

    tracing::info!(
        handler = "backup_accounts",
        identity_key = %key_prefix(&identity_key),
        payload_bytes = payload.len(),
        status = 200,
        "Responding: backup stored"
    );

    Ok(Json(MessageResponse {
        success: true,
        message: "Accounts backed up successfully".into(),
    }))
}

/// POST /api/restore-accounts — return the current backup: the ciphertext
/// string verbatim, or the decoded entry array for plaintext rows.
pub async fn restore_accounts(
    State(state): State<AppState>,
    Json(body): Json<RestoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(handler = "restore_accounts", "Handler: POST /api/restore-accounts");

    let identity_key = resolve_registered_key(&state, &body.account_number).await?;

    tracing::debug!(handler = "restore_accounts", "Dispatching to repo.latest_backup");
    let row = state
        .repo
        .latest_backup(&identity_key)
        .await?
        .ok_or_else(|| AppError::NotFound("No backup found".into()))?;

    let accounts = match row.mode {
        BackupMode::Encrypted => serde_json::Value::String(row.payload),
        BackupMode::Plain => serde_json::from_str(&row.payload)
            .map_err(|e| AppError::Internal(format!("stored payload undecodable: {e}")))?,
    };

    tracing::info!(
        handler = "restore_accounts",
        identity_key = %key_prefix(&identity_key),
        mode = ?row.mode,
        status = 200,
        "Responding: backup restored"
    );

    Ok(Json(RestoreResponse {
        success: true,
        accounts,
    }))
}

/// POST /api/delete-account — remove every entry with the given id from a
/// plaintext backup. Encrypted backups cannot be edited server-side.
pub async fn delete_entry(
    State(state): State<AppState>,
    Json(body): Json<DeleteEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(handler = "delete_entry", "Handler: POST /api/delete-account");

    if !is_valid_account_number(&body.account_number) {
        return Err(AppError::BadRequest("Invalid account number format".into()));
    }
    let target = EntryId::from_value(&body.account_id)
        .ok_or_else(|| AppError::BadRequest("Invalid account ID format".into()))?;

    let identity_key = hash_account_number(&body.account_number);
    if !state.repo.account_exists(&identity_key).await? {
        return Err(AppError::InvalidAccount);
    }

    tracing::debug!(handler = "delete_entry", "Dispatching to repo.latest_backup");
    let row = state
        .repo
        .latest_backup(&identity_key)
        .await?
        .ok_or_else(|| AppError::NotFound("No backup found".into()))?;

    if row.mode == BackupMode::Encrypted {
        tracing::warn!(handler = "delete_entry", "Rejected: backup is encrypted");
        return Err(AppError::Conflict(
            "Cannot delete from encrypted backup. Please delete locally and re-sync.".into(),
        ));
    }

    let mut entries: Vec<CredentialEntry> = serde_json::from_str(&row.payload)
        .map_err(|e| AppError::Internal(format!("stored payload undecodable: {e}")))?;

    let before = entries.len();
    // Every match goes, not just the first; ids are caller-chosen and the
    // store never enforced their uniqueness.
    entries.retain(|e| e.id.as_ref() != Some(&target));
    let removed = before - entries.len();

    let payload = serde_json::to_string(&entries)
        .map_err(|e| AppError::Internal(format!("payload serialization failed: {e}")))?;

    // Overwrite in place even when empty: a backup with zero entries is a
    // live row, distinct from "no backup".
    tracing::debug!(handler = "delete_entry", removed, "Dispatching to repo.update_backup_payload");
    state.repo.update_backup_payload(&identity_key, &payload).await?;

    tracing::info!(
        handler = "delete_entry",
        identity_key = %key_prefix(&identity_key),
        removed,
        remaining = entries.len(),
        status = 200,
        "Responding: entries deleted"
    );

    Ok(Json(MessageResponse {
        success: true,
        message: "Account deleted successfully".into(),
    }))
}

/// DELETE /api/delete-user — erase the backup row; the registration stays.
pub async fn delete_user(
    State(state): State<AppState>,
    Json(body): Json<DeleteUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(handler = "delete_user", "Handler: DELETE /api/delete-user");

    let identity_key = resolve_registered_key(&state, &body.account_number).await?;

    tracing::debug!(handler = "delete_user", "Dispatching to repo.delete_backup");
    let deleted = state.repo.delete_backup(&identity_key).await?;

    tracing::info!(
        handler = "delete_user",
        identity_key = %key_prefix(&identity_key),
        deleted,
        status = 200,
        "Responding: backup data deleted"
    );

    Ok(Json(MessageResponse {
        success: true,
        message: "User backup data deleted successfully".into(),
    }))
}
