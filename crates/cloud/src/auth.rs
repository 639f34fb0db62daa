//! Process-wide credential context.

use std::sync::RwLock;

use reuploader_protocol::AuthMode;

/// Credentials plus the identity resolved during verification.
///
/// Constructed once at process start and shared behind an `Arc`. The
/// mode and secret never change; `owner_id` is written by identity
/// verification (last write wins) and read on every dedup lookup.
#[derive(Debug)]
pub struct CredentialContext {
    auth: AuthMode,
    owner_id: RwLock<Option<u64>>,
}

impl CredentialContext {
    /// Creates a context with no resolved identity.
    pub fn new(auth: AuthMode) -> Self {
        Self {
            auth,
            owner_id: RwLock::new(None),
        }
    }

    /// The credential mode.
    pub fn auth(&self) -> &AuthMode {
        &self.auth
    }

    /// Short mode name ("cookie" or "key") for the ping response.
    pub fn mode_name(&self) -> &'static str {
        self.auth.name()
    }

    /// Whether listing (and therefore dedup) is available.
    pub fn is_cookie(&self) -> bool {
        matches!(self.auth, AuthMode::Cookie(_))
    }

    /// Owner id resolved by identity verification, if any.
    pub fn owner_id(&self) -> Option<u64> {
        *self.owner_id.read().expect("owner_id lock poisoned")
    }

    /// Records the owner id after a successful cookie-mode verification.
    pub fn set_owner_id(&self, id: u64) {
        *self.owner_id.write().expect("owner_id lock poisoned") = Some(id);
    }
}
