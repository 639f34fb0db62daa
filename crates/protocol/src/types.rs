use serde::{Deserialize, Serialize};

use crate::animation::AnimationPayload;
use crate::constants::ERROR_DETAIL_MAX;

/// Credential mode for outbound platform calls.
///
/// The enum makes the "exactly one secret" invariant structural: a
/// context is either cookie-backed or key-backed, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// Session cookie. Supports identity resolution and listing.
    Cookie(String),
    /// API key. Publish and download only; no owner identity.
    ApiKey(String),
}

impl AuthMode {
    /// Short mode name used in the ping response.
    pub fn name(&self) -> &'static str {
        match self {
            AuthMode::Cookie(_) => "cookie",
            AuthMode::ApiKey(_) => "key",
        }
    }

    /// The raw secret material.
    pub fn secret(&self) -> &str {
        match self {
            AuthMode::Cookie(s) | AuthMode::ApiKey(s) => s,
        }
    }
}

/// A single re-publication request from the plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRequest {
    /// Source asset identifier. Optional when a structured payload is
    /// supplied; in that case it is carried through for correlation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_id: Option<String>,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub asset_category: String,
    #[serde(default)]
    pub check_existing: bool,
    /// When present, asset bytes are synthesized instead of downloaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_payload: Option<AnimationPayload>,
}

/// Terminal status of a handled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "invalid_request")]
    InvalidRequest,
    #[serde(rename = "download_failed")]
    DownloadFailed,
    #[serde(rename = "build_failed")]
    BuildFailed,
    #[serde(rename = "upload_failed")]
    UploadFailed,
}

/// Result of one re-publication request, returned to the plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_id: Option<String>,
    pub status: OutcomeStatus,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutcomeRecord {
    /// A successful outcome for a freshly published asset.
    pub fn published(old_id: Option<String>, new_id: String) -> Self {
        Self {
            old_id,
            new_id: Some(new_id),
            status: OutcomeStatus::Ok,
            skipped: false,
            error: None,
        }
    }

    /// A successful outcome satisfied by dedup, without publishing.
    pub fn skipped(old_id: Option<String>, existing_id: String) -> Self {
        Self {
            old_id,
            new_id: Some(existing_id),
            status: OutcomeStatus::Ok,
            skipped: true,
            error: None,
        }
    }

    /// A failure outcome. The detail string is truncated so upstream
    /// response bodies never flood the plugin-facing reply.
    pub fn failure(
        old_id: Option<String>,
        status: OutcomeStatus,
        detail: impl Into<String>,
    ) -> Self {
        let mut detail = detail.into();
        if detail.len() > ERROR_DETAIL_MAX {
            let cut = (0..=ERROR_DETAIL_MAX)
                .rev()
                .find(|i| detail.is_char_boundary(*i))
                .unwrap_or(0);
            detail.truncate(cut);
        }
        Self {
            old_id,
            new_id: None,
            status,
            skipped: false,
            error: Some(detail),
        }
    }
}

/// Liveness probe response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub alive: bool,
    pub auth_mode: String,
}
