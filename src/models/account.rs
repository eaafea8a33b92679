use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct VerifyAccountRequest {
    pub account_number: String,
}

#[derive(Debug, Serialize)]
pub struct CreateAccountResponse {
    pub success: bool,
    /// The freshly issued secret — the only time the server ever returns it.
    pub account_number: String,
}

/// Generic `{success, message}` body shared by the mutation endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}
