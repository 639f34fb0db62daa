//! Authenticated platform client.
//!
//! Async HTTP client using `reqwest` for the four outbound operations
//! the relay needs: identity verification, paginated creations listing,
//! asset download (with legacy fallback) and multipart publish. All
//! calls carry the fixed client identifier plus exactly one credential
//! header, depending on the [`auth::CredentialContext`] mode.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::CredentialContext;
pub use client::{Client, CreationEntry, CreationsPage, Endpoints, VerifiedIdentity};
pub use error::{ApiError, AuthError, FetchError, PublishError};
