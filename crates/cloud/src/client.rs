//! Platform API client.
//!
//! One `reqwest` client with default headers carrying the fixed client
//! identifier plus the credential header for the active mode. Metadata
//! calls use the short timeout; publish uses the long one.

use std::sync::Arc;

use reqwest::header::{COOKIE, HeaderMap, HeaderValue, USER_AGENT as UA};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use reuploader_protocol::AuthMode;
use reuploader_protocol::constants::{
    API_TIMEOUT, ERROR_DETAIL_MAX, LIST_PAGE_LIMIT, UPLOAD_DESCRIPTION, UPLOAD_TIMEOUT, USER_AGENT,
};

use crate::auth::CredentialContext;
use crate::error::{ApiError, AuthError, FetchError, PublishError};

/// Outbound endpoint set.
///
/// Defaults point at production; tests override individual entries to
/// aim calls at local mock servers.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Authenticated-user endpoint (cookie-mode identity check).
    pub identity: String,
    /// Paginated creations listing, scoped by owner and category.
    pub creations: String,
    /// Primary asset delivery endpoint; asset id appended as a path segment.
    pub primary_delivery: String,
    /// Legacy delivery endpoint; asset id passed as an `id` query parameter.
    pub legacy_delivery: String,
    /// Multipart publish endpoint. Also probed for key-mode verification.
    pub upload: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            identity: "https://users.roblox.com/v1/users/authenticated".into(),
            creations: "https://itemconfiguration.roblox.com/v1/creations/get-assets".into(),
            primary_delivery: "https://apis.roblox.com/asset-delivery-api/v1/assetId".into(),
            legacy_delivery: "https://assetdelivery.roblox.com/v1/asset".into(),
            upload: "https://apis.roblox.com/assets/v1/assets".into(),
        }
    }
}

/// Result of startup identity verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifiedIdentity {
    /// Cookie mode: the platform resolved the session to a user.
    User { id: u64, name: String },
    /// Key mode: the key is syntactically valid; no identity exists.
    KeyOnly,
}

/// One entry from the creations listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationEntry {
    pub name: String,
    #[serde(deserialize_with = "de_id_string")]
    pub asset_id: String,
}

/// One page of the creations listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationsPage {
    #[serde(default)]
    pub data: Vec<CreationEntry>,
    #[serde(default)]
    pub next_page_cursor: Option<String>,
}

#[derive(Deserialize)]
struct IdentityResponse {
    id: u64,
    name: String,
}

/// Authenticated platform client.
#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    endpoints: Endpoints,
    creds: Arc<CredentialContext>,
}

impl Client {
    /// Creates a client against the production endpoints.
    pub fn new(creds: Arc<CredentialContext>) -> Result<Self, AuthError> {
        Self::with_endpoints(creds, Endpoints::default())
    }

    /// Creates a client against explicit endpoints.
    pub fn with_endpoints(
        creds: Arc<CredentialContext>,
        endpoints: Endpoints,
    ) -> Result<Self, AuthError> {
        let mut headers = HeaderMap::new();
        headers.insert(UA, HeaderValue::from_static(USER_AGENT));

        match creds.auth() {
            AuthMode::Cookie(secret) => {
                let mut value = HeaderValue::from_str(&format!(".ROBLOSECURITY={secret}"))
                    .map_err(|_| AuthError::InvalidSecret)?;
                value.set_sensitive(true);
                headers.insert(COOKIE, value);
            }
            AuthMode::ApiKey(secret) => {
                let mut value =
                    HeaderValue::from_str(secret).map_err(|_| AuthError::InvalidSecret)?;
                value.set_sensitive(true);
                headers.insert("x-api-key", value);
            }
        }

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            endpoints,
            creds,
        })
    }

    /// The shared credential context.
    pub fn credentials(&self) -> &CredentialContext {
        &self.creds
    }

    /// Verifies the configured credentials against the platform.
    ///
    /// Cookie mode requires a 2xx from the authenticated-user endpoint
    /// and records the resolved owner id in the credential context. Key
    /// mode probes the assets endpoint; 2xx, 403 and 404 all count as a
    /// usable key (the probe endpoint may simply be outside the key's
    /// scopes), 401 does not.
    pub async fn verify_identity(&self) -> Result<VerifiedIdentity, AuthError> {
        match self.creds.auth() {
            AuthMode::Cookie(_) => {
                let resp = self
                    .http
                    .get(&self.endpoints.identity)
                    .timeout(API_TIMEOUT)
                    .send()
                    .await?;
                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(AuthError::Rejected {
                        status: status.as_u16(),
                        body: truncate_body(body),
                    });
                }
                let identity: IdentityResponse = serde_json::from_slice(&resp.bytes().await?)?;
                self.creds.set_owner_id(identity.id);
                debug!(owner = identity.id, name = %identity.name, "identity verified");
                Ok(VerifiedIdentity::User {
                    id: identity.id,
                    name: identity.name,
                })
            }
            AuthMode::ApiKey(_) => {
                let resp = self
                    .http
                    .get(&self.endpoints.upload)
                    .timeout(API_TIMEOUT)
                    .send()
                    .await?;
                let status = resp.status();
                match status.as_u16() {
                    s if status.is_success() => {
                        debug!(status = s, "key probe accepted");
                        Ok(VerifiedIdentity::KeyOnly)
                    }
                    403 | 404 => Ok(VerifiedIdentity::KeyOnly),
                    s => {
                        let body = resp.text().await.unwrap_or_default();
                        Err(AuthError::Rejected {
                            status: s,
                            body: truncate_body(body),
                        })
                    }
                }
            }
        }
    }

    /// Fetches one page of the owner's creations in a category.
    ///
    /// `cursor` is empty on the first call and the server-supplied token
    /// afterwards.
    pub async fn list_creations(
        &self,
        owner_id: u64,
        category: &str,
        cursor: &str,
    ) -> Result<CreationsPage, ApiError> {
        let mut params = vec![
            ("userId".to_string(), owner_id.to_string()),
            ("assetType".to_string(), category.to_string()),
            ("limit".to_string(), LIST_PAGE_LIMIT.to_string()),
        ];
        if !cursor.is_empty() {
            params.push(("cursor".to_string(), cursor.to_string()));
        }

        let body = self.get_bytes(&self.endpoints.creations, &params).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Downloads the original bytes of a published asset.
    ///
    /// Tries the primary delivery endpoint; on transport error or
    /// non-2xx, retries once against the legacy endpoint with the same
    /// auth headers before giving up.
    pub async fn fetch_asset(&self, asset_id: &str) -> Result<Vec<u8>, FetchError> {
        let primary_url = format!("{}/{}", self.endpoints.primary_delivery, asset_id);
        let primary = match self.get_bytes(&primary_url, &[]).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => e,
        };

        warn!(asset = asset_id, error = %primary, "primary delivery failed, trying legacy");

        let fallback_url = format!("{}?id={}", self.endpoints.legacy_delivery, asset_id);
        self.get_bytes(&fallback_url, &[])
            .await
            .map_err(|fallback| FetchError { primary, fallback })
    }

    /// Publishes asset bytes under the caller's credentials.
    ///
    /// Returns the new asset id extracted from the JSON response.
    pub async fn publish_asset(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        display_name: &str,
        category: &str,
    ) -> Result<String, PublishError> {
        let metadata = publish_metadata(display_name, category);
        let form = Form::new()
            .part(
                "request",
                Part::text(metadata.to_string()).mime_str("application/json")?,
            )
            .part(
                "fileContent",
                Part::bytes(bytes)
                    .file_name(filename.to_string())
                    .mime_str("application/octet-stream")?,
            );

        let resp = self
            .http
            .post(&self.endpoints.upload)
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::Status {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        let body: Value = serde_json::from_slice(&resp.bytes().await?)?;
        extract_asset_id(&body).ok_or(PublishError::MalformedResponse)
    }

    /// Performs an authenticated GET with the short timeout.
    async fn get_bytes(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Vec<u8>, ApiError> {
        let resp = self
            .http
            .get(url)
            .query(params)
            .timeout(API_TIMEOUT)
            .send()
            .await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

/// Builds the JSON metadata part of a publish request.
fn publish_metadata(display_name: &str, category: &str) -> Value {
    json!({
        "assetType": category,
        "displayName": display_name,
        "description": UPLOAD_DESCRIPTION,
        "creationContext": {},
    })
}

/// Response fields that may carry the new asset id, in precedence order.
#[derive(Debug, Clone, Copy)]
enum IdField {
    AssetId,
    Id,
    DataAssetId,
}

const ID_PRECEDENCE: [IdField; 3] = [IdField::AssetId, IdField::Id, IdField::DataAssetId];

impl IdField {
    fn lookup(self, body: &Value) -> Option<String> {
        let value = match self {
            IdField::AssetId => body.get("assetId"),
            IdField::Id => body.get("id"),
            IdField::DataAssetId => body.get("data")?.get("assetId"),
        }?;
        id_string(value)
    }
}

/// Extracts the new asset id from a publish response, trying each known
/// field in fixed priority order. First match wins.
fn extract_asset_id(body: &Value) -> Option<String> {
    ID_PRECEDENCE.iter().find_map(|field| field.lookup(body))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Caps upstream response bodies carried in error messages.
fn truncate_body(mut body: String) -> String {
    if body.len() > ERROR_DETAIL_MAX {
        let cut = (0..=ERROR_DETAIL_MAX)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        body.truncate(cut);
    }
    body
}

/// Accepts a numeric or string asset id and normalizes to a string.
fn de_id_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdValue {
        Num(u64),
        Str(String),
    }

    Ok(match IdValue::deserialize(de)? {
        IdValue::Num(n) => n.to_string(),
        IdValue::Str(s) => s,
    })
}
