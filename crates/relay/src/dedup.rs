//! Best-effort lookup of an already-published asset by name.

use tracing::{debug, warn};

use reuploader_cloud::{ApiError, Client};
use reuploader_protocol::constants::MAX_DEDUP_PAGES;

/// Internal result of a dedup lookup.
///
/// `NotFound` and `LookupFailed` collapse to the same client-facing
/// answer ("no match, keep going"), but stay distinct so failures can
/// be logged and asserted on.
#[derive(Debug)]
pub enum DedupOutcome {
    /// An asset with exactly this name already exists.
    Found(String),
    NotFound,
    /// A listing page failed; dedup degrades to "not found".
    LookupFailed(ApiError),
}

impl DedupOutcome {
    /// The existing asset id, if one was found.
    pub fn existing_id(self) -> Option<String> {
        match self {
            DedupOutcome::Found(id) => Some(id),
            _ => None,
        }
    }
}

/// Scans the owner's creations for an exact (case-sensitive) name match.
///
/// Short-circuits to `NotFound` without any network call when the
/// context is key-based or the owner id is unresolved. Otherwise pages
/// through the listing in server order and returns the first match.
/// Page order across the listing is not guaranteed stable by the
/// platform; the first match encountered is treated as authoritative.
/// At most [`MAX_DEDUP_PAGES`] pages are scanned, so a cursor chain
/// that never ends degrades to `NotFound` instead of looping.
pub async fn find_existing(client: &Client, display_name: &str, category: &str) -> DedupOutcome {
    if !client.credentials().is_cookie() {
        return DedupOutcome::NotFound;
    }
    let Some(owner_id) = client.credentials().owner_id() else {
        return DedupOutcome::NotFound;
    };

    let mut cursor = String::new();
    for _ in 0..MAX_DEDUP_PAGES {
        let page = match client.list_creations(owner_id, category, &cursor).await {
            Ok(page) => page,
            Err(e) => return DedupOutcome::LookupFailed(e),
        };

        if let Some(hit) = page.data.iter().find(|entry| entry.name == display_name) {
            debug!(name = display_name, id = %hit.asset_id, "dedup hit");
            return DedupOutcome::Found(hit.asset_id.clone());
        }

        match page.next_page_cursor {
            Some(next) if !next.is_empty() => cursor = next,
            _ => return DedupOutcome::NotFound,
        }
    }

    warn!(
        name = display_name,
        pages = MAX_DEDUP_PAGES,
        "dedup page cap reached without a match"
    );
    DedupOutcome::NotFound
}
