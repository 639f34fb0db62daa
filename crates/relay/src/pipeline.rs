//! Per-request re-publication orchestrator.
//!
//! Each request runs the same state machine: validate, optional dedup,
//! acquire bytes (download or synthesize), publish. Every failure is
//! converted into a failure outcome at this boundary; nothing below it
//! escapes to the transport layer.

use tracing::{info, warn};

use reuploader_animation::encode;
use reuploader_cloud::{AuthError, Client, VerifiedIdentity};
use reuploader_protocol::constants::ANIMATION_CATEGORY;
use reuploader_protocol::{AnimationPayload, AssetRequest, OutcomeRecord, OutcomeStatus, PingResponse};

use crate::dedup::{self, DedupOutcome};

/// How the asset bytes for a request are obtained.
enum Source<'a> {
    /// Download the original asset by id.
    Fetch(&'a str),
    /// Synthesize a document from a structured description.
    Synthesize(&'a AnimationPayload),
}

/// The relay core exposed to the plugin-facing transport.
///
/// Holds no per-request state; concurrent requests share the one client
/// and credential context and run independently.
pub struct RelayService {
    client: Client,
}

impl RelayService {
    /// Wraps an authenticated client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The underlying platform client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Verifies credentials once at startup.
    ///
    /// The embedding process must treat an error here as fatal: no
    /// requests are served without verified credentials.
    pub async fn verify_startup(&self) -> Result<VerifiedIdentity, AuthError> {
        let identity = self.client.verify_identity().await?;
        match &identity {
            VerifiedIdentity::User { id, name } => {
                info!(owner = id, name = %name, "credentials verified");
            }
            VerifiedIdentity::KeyOnly => info!("API key verified"),
        }
        Ok(identity)
    }

    /// Liveness probe. No side effects.
    pub fn ping(&self) -> PingResponse {
        PingResponse {
            alive: true,
            auth_mode: self.client.credentials().mode_name().to_string(),
        }
    }

    /// Re-publishes an existing asset byte-for-byte.
    pub async fn reupload(&self, req: &AssetRequest) -> OutcomeRecord {
        let Some(old_id) = req.old_id.as_deref().filter(|id| !id.is_empty()) else {
            return Self::invalid(req, "missing oldId");
        };
        if req.display_name.is_empty() || req.asset_category.is_empty() {
            return Self::invalid(req, "missing displayName or assetCategory");
        }

        self.run(req, &req.asset_category, Source::Fetch(old_id))
            .await
    }

    /// Publishes an asset synthesized from a structured animation
    /// description. The category is fixed to animations for this path;
    /// `oldId` is optional and used only for response correlation.
    pub async fn reupload_from_description(&self, req: &AssetRequest) -> OutcomeRecord {
        if req.display_name.is_empty() {
            return Self::invalid(req, "missing displayName");
        }
        let Some(payload) = req.structured_payload.as_ref() else {
            return Self::invalid(req, "missing structuredPayload");
        };

        self.run(req, ANIMATION_CATEGORY, Source::Synthesize(payload))
            .await
    }

    /// Runs dedup, acquire and publish for one validated request.
    async fn run(&self, req: &AssetRequest, category: &str, source: Source<'_>) -> OutcomeRecord {
        if req.check_existing {
            match dedup::find_existing(&self.client, &req.display_name, category).await {
                DedupOutcome::Found(id) => {
                    info!(name = %req.display_name, existing = %id, "satisfied by existing asset");
                    return OutcomeRecord::skipped(req.old_id.clone(), id);
                }
                DedupOutcome::LookupFailed(e) => {
                    warn!(name = %req.display_name, error = %e, "dedup lookup failed, continuing");
                }
                DedupOutcome::NotFound => {}
            }
        }

        let (bytes, filename) = match source {
            Source::Fetch(old_id) => match self.client.fetch_asset(old_id).await {
                Ok(bytes) => (bytes, format!("asset_{old_id}.bin")),
                Err(e) => {
                    warn!(old_id, error = %e, "download failed");
                    return OutcomeRecord::failure(
                        req.old_id.clone(),
                        OutcomeStatus::DownloadFailed,
                        e.to_string(),
                    );
                }
            },
            Source::Synthesize(payload) => match encode(payload, &req.display_name) {
                Ok(bytes) => (
                    bytes,
                    format!("{}.rbxmx", sanitize_filename(&req.display_name)),
                ),
                Err(e) => {
                    warn!(name = %req.display_name, error = %e, "encoding failed");
                    return OutcomeRecord::failure(
                        req.old_id.clone(),
                        OutcomeStatus::BuildFailed,
                        e.to_string(),
                    );
                }
            },
        };

        match self
            .client
            .publish_asset(bytes, &filename, &req.display_name, category)
            .await
        {
            Ok(new_id) => {
                info!(old_id = req.old_id.as_deref(), new_id = %new_id, "published");
                OutcomeRecord::published(req.old_id.clone(), new_id)
            }
            Err(e) => {
                warn!(name = %req.display_name, error = %e, "upload failed");
                OutcomeRecord::failure(
                    req.old_id.clone(),
                    OutcomeStatus::UploadFailed,
                    e.to_string(),
                )
            }
        }
    }

    fn invalid(req: &AssetRequest, detail: &str) -> OutcomeRecord {
        OutcomeRecord::failure(req.old_id.clone(), OutcomeStatus::InvalidRequest, detail)
    }
}

/// Derives a safe filename stem from a display name.
fn sanitize_filename(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.chars().all(|c| c == '_') {
        "animation".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use reuploader_cloud::{CredentialContext, Endpoints};
    use reuploader_protocol::AuthMode;

    use crate::testutil::{mock_server, unroutable_endpoints};

    pub(crate) fn cookie_service(eps: Endpoints, owner: Option<u64>) -> RelayService {
        let creds = Arc::new(CredentialContext::new(AuthMode::Cookie("c".into())));
        if let Some(id) = owner {
            creds.set_owner_id(id);
        }
        RelayService::new(Client::with_endpoints(creds, eps).unwrap())
    }

    fn key_service(eps: Endpoints) -> RelayService {
        let creds = Arc::new(CredentialContext::new(AuthMode::ApiKey("k".into())));
        RelayService::new(Client::with_endpoints(creds, eps).unwrap())
    }

    fn fetch_request() -> AssetRequest {
        AssetRequest {
            old_id: Some("111".into()),
            display_name: "Jump".into(),
            asset_category: "Animation".into(),
            check_existing: false,
            structured_payload: None,
        }
    }

    fn animation_payload() -> AnimationPayload {
        serde_json::from_str(
            r#"{"loop":true,"priority":2,"keyframes":[
                {"name":"KF1","time":0.0,"poses":[
                    {"name":"Root","weight":1,"easingStyle":0,"easingDirection":0,
                     "transform":[0,0,0,1,0,0,0,1,0,0,0,1]}
                ]}
            ]}"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn reupload_fetches_and_publishes() {
        let (durl, _, dh) = mock_server(200, "ASSETBYTES").await;
        let (uurl, _, uh) = mock_server(200, r#"{"assetId":"999"}"#).await;
        let mut eps = unroutable_endpoints();
        eps.primary_delivery = durl;
        eps.upload = uurl;

        let svc = cookie_service(eps, Some(123));
        let outcome = svc.reupload(&fetch_request()).await;

        assert_eq!(outcome.old_id.as_deref(), Some("111"));
        assert_eq!(outcome.new_id.as_deref(), Some("999"));
        assert_eq!(outcome.status, OutcomeStatus::Ok);
        assert!(!outcome.skipped);
        assert!(outcome.error.is_none());

        dh.abort();
        uh.abort();
    }

    #[tokio::test]
    async fn reupload_reports_download_failure() {
        let (purl, _, ph) = mock_server(404, "gone").await;
        let (furl, _, fh) = mock_server(404, "gone").await;
        let (uurl, uhits, uh) = mock_server(200, r#"{"assetId":"999"}"#).await;
        let mut eps = unroutable_endpoints();
        eps.primary_delivery = purl;
        eps.legacy_delivery = furl;
        eps.upload = uurl;

        let svc = cookie_service(eps, Some(123));
        let outcome = svc.reupload(&fetch_request()).await;

        assert_eq!(outcome.status, OutcomeStatus::DownloadFailed);
        assert!(outcome.new_id.is_none());
        assert!(!outcome.error.as_deref().unwrap_or("").is_empty());
        assert_eq!(uhits.load(Ordering::SeqCst), 0);

        ph.abort();
        fh.abort();
        uh.abort();
    }

    #[tokio::test]
    async fn reupload_reports_upload_failure() {
        let (durl, _, dh) = mock_server(200, "ASSETBYTES").await;
        let (uurl, _, uh) = mock_server(500, "server error").await;
        let mut eps = unroutable_endpoints();
        eps.primary_delivery = durl;
        eps.upload = uurl;

        let svc = cookie_service(eps, Some(123));
        let outcome = svc.reupload(&fetch_request()).await;

        assert_eq!(outcome.status, OutcomeStatus::UploadFailed);
        assert!(outcome.new_id.is_none());
        assert!(outcome.error.is_some());

        dh.abort();
        uh.abort();
    }

    #[tokio::test]
    async fn dedup_match_skips_fetch_and_publish() {
        let (lurl, _, lh) =
            mock_server(200, r#"{"data":[{"name":"Jump","assetId":555}]}"#).await;
        let (durl, dhits, dh) = mock_server(200, "ASSETBYTES").await;
        let (uurl, uhits, uh) = mock_server(200, r#"{"assetId":"999"}"#).await;
        let mut eps = unroutable_endpoints();
        eps.creations = lurl;
        eps.primary_delivery = durl;
        eps.upload = uurl;

        let svc = cookie_service(eps, Some(123));
        let mut req = fetch_request();
        req.check_existing = true;
        let outcome = svc.reupload(&req).await;

        assert_eq!(outcome.status, OutcomeStatus::Ok);
        assert!(outcome.skipped);
        assert_eq!(outcome.new_id.as_deref(), Some("555"));
        assert_eq!(dhits.load(Ordering::SeqCst), 0);
        assert_eq!(uhits.load(Ordering::SeqCst), 0);

        lh.abort();
        dh.abort();
        uh.abort();
    }

    #[tokio::test]
    async fn dedup_failure_falls_through_to_publish() {
        let (lurl, lhits, lh) = mock_server(500, "listing down").await;
        let (durl, _, dh) = mock_server(200, "ASSETBYTES").await;
        let (uurl, _, uh) = mock_server(200, r#"{"assetId":"999"}"#).await;
        let mut eps = unroutable_endpoints();
        eps.creations = lurl;
        eps.primary_delivery = durl;
        eps.upload = uurl;

        let svc = cookie_service(eps, Some(123));
        let mut req = fetch_request();
        req.check_existing = true;
        let outcome = svc.reupload(&req).await;

        assert_eq!(outcome.status, OutcomeStatus::Ok);
        assert!(!outcome.skipped);
        assert_eq!(outcome.new_id.as_deref(), Some("999"));
        assert_eq!(lhits.load(Ordering::SeqCst), 1);

        lh.abort();
        dh.abort();
        uh.abort();
    }

    #[tokio::test]
    async fn key_mode_never_lists() {
        let (lurl, lhits, lh) =
            mock_server(200, r#"{"data":[{"name":"Jump","assetId":555}]}"#).await;
        let (durl, _, dh) = mock_server(200, "ASSETBYTES").await;
        let (uurl, _, uh) = mock_server(200, r#"{"assetId":"999"}"#).await;
        let mut eps = unroutable_endpoints();
        eps.creations = lurl;
        eps.primary_delivery = durl;
        eps.upload = uurl;

        let svc = key_service(eps);
        let mut req = fetch_request();
        req.check_existing = true;
        let outcome = svc.reupload(&req).await;

        // Dedup must short-circuit to "not found" under key mode.
        assert_eq!(outcome.status, OutcomeStatus::Ok);
        assert!(!outcome.skipped);
        assert_eq!(lhits.load(Ordering::SeqCst), 0);

        lh.abort();
        dh.abort();
        uh.abort();
    }

    #[tokio::test]
    async fn description_path_synthesizes_and_publishes() {
        let (uurl, _, uh) = mock_server(200, r#"{"assetId":777}"#).await;
        let mut eps = unroutable_endpoints();
        eps.upload = uurl;

        let svc = key_service(eps);
        let req = AssetRequest {
            old_id: Some("111".into()),
            display_name: "Run".into(),
            asset_category: String::new(),
            check_existing: false,
            structured_payload: Some(animation_payload()),
        };
        let outcome = svc.reupload_from_description(&req).await;

        assert_eq!(outcome.status, OutcomeStatus::Ok);
        assert_eq!(outcome.new_id.as_deref(), Some("777"));
        assert_eq!(outcome.old_id.as_deref(), Some("111"));

        uh.abort();
    }

    #[tokio::test]
    async fn description_path_reports_build_failure() {
        let (uurl, uhits, uh) = mock_server(200, r#"{"assetId":777}"#).await;
        let mut eps = unroutable_endpoints();
        eps.upload = uurl;

        let svc = key_service(eps);
        let mut payload = animation_payload();
        payload.keyframes[0].poses[0].transform.truncate(3);
        let req = AssetRequest {
            old_id: None,
            display_name: "Run".into(),
            asset_category: String::new(),
            check_existing: false,
            structured_payload: Some(payload),
        };
        let outcome = svc.reupload_from_description(&req).await;

        assert_eq!(outcome.status, OutcomeStatus::BuildFailed);
        assert!(outcome.new_id.is_none());
        assert!(outcome.error.is_some());
        assert_eq!(uhits.load(Ordering::SeqCst), 0);

        uh.abort();
    }

    #[tokio::test]
    async fn reupload_rejects_missing_old_id() {
        let svc = key_service(unroutable_endpoints());
        let mut req = fetch_request();
        req.old_id = None;
        let outcome = svc.reupload(&req).await;

        assert_eq!(outcome.status, OutcomeStatus::InvalidRequest);
        assert!(outcome.error.as_deref().unwrap().contains("oldId"));
    }

    #[tokio::test]
    async fn reupload_rejects_missing_category() {
        let svc = key_service(unroutable_endpoints());
        let mut req = fetch_request();
        req.asset_category = String::new();
        let outcome = svc.reupload(&req).await;
        assert_eq!(outcome.status, OutcomeStatus::InvalidRequest);
    }

    #[tokio::test]
    async fn description_path_rejects_missing_payload() {
        let svc = key_service(unroutable_endpoints());
        let req = AssetRequest {
            old_id: None,
            display_name: "Run".into(),
            asset_category: String::new(),
            check_existing: false,
            structured_payload: None,
        };
        let outcome = svc.reupload_from_description(&req).await;

        assert_eq!(outcome.status, OutcomeStatus::InvalidRequest);
        assert!(outcome.error.as_deref().unwrap().contains("structuredPayload"));
    }

    #[tokio::test]
    async fn ping_reports_auth_mode() {
        let cookie = cookie_service(unroutable_endpoints(), None);
        let key = key_service(unroutable_endpoints());

        let p = cookie.ping();
        assert!(p.alive);
        assert_eq!(p.auth_mode, "cookie");
        assert_eq!(key.ping().auth_mode, "key");
    }

    #[tokio::test]
    async fn startup_verification_enables_dedup() {
        let (iurl, _, ih) = mock_server(200, r#"{"id":123,"name":"Builder"}"#).await;
        let (lurl, _, lh) =
            mock_server(200, r#"{"data":[{"name":"Jump","assetId":555}]}"#).await;
        let mut eps = unroutable_endpoints();
        eps.identity = iurl;
        eps.creations = lurl;

        let svc = cookie_service(eps, None);
        svc.verify_startup().await.unwrap();

        let mut req = fetch_request();
        req.check_existing = true;
        let outcome = svc.reupload(&req).await;

        assert!(outcome.skipped);
        assert_eq!(outcome.new_id.as_deref(), Some("555"));

        ih.abort();
        lh.abort();
    }

    #[test]
    fn sanitize_filename_keeps_safe_chars() {
        assert_eq!(sanitize_filename("Jump_01-final"), "Jump_01-final");
        assert_eq!(sanitize_filename("My Anim!"), "My_Anim_");
        assert_eq!(sanitize_filename("???"), "animation");
        assert_eq!(sanitize_filename(""), "animation");
    }
}
