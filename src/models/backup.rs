use serde::{Deserialize, Serialize};

/// Client-side ciphertext carries this fixed prefix (OpenSSL-salted base64).
/// It is checked only at write time; reads trust the stored mode column.
pub const CIPHERTEXT_MARKER: &str = "U2FsdGVkX1";

/// Stored payload discriminator. Persisted as a column so reads never have
/// to sniff the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum BackupMode {
    Plain,
    Encrypted,
}

/// Backup row as stored, minus the identity key (a query parameter).
#[derive(Debug, sqlx::FromRow)]
pub struct BackupRow {
    pub payload: String,
    pub mode: BackupMode,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct BackupRequest {
    pub account_number: String,
    /// Either a ciphertext string (`encrypted: true`) or an array of entry
    /// objects. Kept as raw JSON so shape failures report as validation
    /// errors rather than body-parse errors.
    #[serde(default)]
    pub accounts: serde_json::Value,
    #[serde(default)]
    pub encrypted: bool,
}

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub account_number: String,
}

#[derive(Debug, Serialize)]
pub struct RestoreResponse {
    pub success: bool,
    /// Ciphertext string for encrypted backups, entry array for plaintext.
    pub accounts: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct DeleteEntryRequest {
    pub account_number: String,
    #[serde(default)]
    pub account_id: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub account_number: String,
}
