use axum::{extract::State, response::IntoResponse, Extension, Json};

use crate::account_number::{generate_account_number, hash_account_number, is_valid_account_number};
use crate::error::AppError;
use crate::middleware::client_addr::ClientAddr;
use crate::models::account::{CreateAccountResponse, MessageResponse, VerifyAccountRequest};
use crate::util::key_prefix;
use crate::AppState;

/// POST /api/create-account — issue a fresh secret account number.
/// Rate-limited by client address: identifier minting is the most abusable
/// operation the server exposes.
pub async fn create_account(
    State(state): State<AppState>,
    Extension(ClientAddr(client_addr)): Extension<ClientAddr>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(
        handler = "create_account",
        client_addr = %client_addr,
        "Handler: POST /api/create-account"
    );

    if !state
        .rate_limiter
        .check(state.repo.as_ref(), &client_addr, "/api/create-account")
        .await?
    {
        return Err(AppError::TooManyRequests(
            "Rate limit exceeded. Try again later.".into(),
        ));
    }

    tracing::debug!(handler = "create_account", "Dispatching to generate_account_number");
    let account_number = generate_account_number(state.repo.as_ref()).await?;

    tracing::info!(
        handler = "create_account",
        identity_key = %key_prefix(&hash_account_number(&account_number)),
        status = 200,
        "Responding: account issued"
    );

    Ok(Json(CreateAccountResponse {
        success: true,
        account_number,
    }))
}

/// POST /api/verify-account — check that a presented number is registered.
/// Rate-limited by client address: this is the brute-force surface.
pub async fn verify_account(
    State(state): State<AppState>,
    Extension(ClientAddr(client_addr)): Extension<ClientAddr>,
    Json(body): Json<VerifyAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(
        handler = "verify_account",
        client_addr = %client_addr,
        "Handler: POST /api/verify-account"
    );

    if !state
        .rate_limiter
        .check(state.repo.as_ref(), &client_addr, "/api/verify-account")
        .await?
    {
        return Err(AppError::TooManyRequests(
            "Rate limit exceeded. Try again later.".into(),
        ));
    }

    if !is_valid_account_number(&body.account_number) {
        tracing::warn!(handler = "verify_account", "Validation failed: malformed account number");
        return Err(AppError::BadRequest("Invalid account number format".into()));
    }

    let identity_key = hash_account_number(&body.account_number);

    tracing::debug!(handler = "verify_account", "Dispatching to repo.account_exists");
    if !state.repo.account_exists(&identity_key).await? {
        return Err(AppError::InvalidAccount);
    }

    tracing::info!(
        handler = "verify_account",
        identity_key = %key_prefix(&identity_key),
        status = 200,
        "Responding: account verified"
    );

    Ok(Json(MessageResponse {
        success: true,
        message: "Account verified successfully".into(),
    }))
}
