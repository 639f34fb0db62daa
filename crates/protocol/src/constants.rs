use std::time::Duration;

/// Client identifier sent with every outbound platform call.
pub const USER_AGENT: &str = "AssetReuploaderRelay/1.0";

/// Timeout for identity, listing and asset download calls.
pub const API_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for the multipart publish call.
///
/// Uploads carry whole asset payloads and may take significantly longer
/// than the metadata calls, so they get their own budget.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size requested from the creations listing endpoint.
pub const LIST_PAGE_LIMIT: u32 = 100;

/// Description attached to every re-published asset.
pub const UPLOAD_DESCRIPTION: &str = "Re-uploaded via relay";

/// Category tag used for synthesized animation assets.
pub const ANIMATION_CATEGORY: &str = "Animation";

/// Priority applied when an animation description omits one.
pub const DEFAULT_PRIORITY: i32 = 0;

/// Weight applied when a pose omits one.
pub const DEFAULT_POSE_WEIGHT: f32 = 1.0;

/// Maximum pose nesting depth accepted by the encoder.
///
/// Rig hierarchies are shallow in practice; the cap exists so a cyclic
/// or hostile payload cannot blow the stack during encoding.
pub const MAX_POSE_DEPTH: usize = 64;

/// Maximum listing pages scanned by one dedup lookup.
///
/// Dedup is best-effort; the cap keeps a server that hands back an
/// endless cursor chain from pinning a worker.
pub const MAX_DEDUP_PAGES: usize = 50;

/// Maximum length of the human-readable detail in a failure outcome.
pub const ERROR_DETAIL_MAX: usize = 400;
