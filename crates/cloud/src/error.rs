//! Client error taxonomy.
//!
//! One enum per failure class so callers can branch on the phase that
//! failed without string matching.

/// Credential invalid or unverifiable at startup.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("identity check rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed identity response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("credential contains characters not usable in a header")]
    InvalidSecret,
}

/// Generic non-2xx or transport failure from a supporting call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Both the primary and the legacy delivery endpoint failed.
#[derive(Debug, thiserror::Error)]
#[error("download failed (primary: {primary}; fallback: {fallback})")]
pub struct FetchError {
    pub primary: ApiError,
    pub fallback: ApiError,
}

/// Publish rejected, or accepted with an unusable response.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upload failed {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upload returned non-JSON body")]
    NonJson(#[from] serde_json::Error),

    #[error("upload succeeded but no asset id found in response")]
    MalformedResponse,
}
