//! Re-publication pipeline.
//!
//! This crate implements the **business logic** of the relay: the
//! best-effort dedup lookup and the per-request orchestration
//! (validate, dedup, acquire bytes, publish). It is a library crate
//! with no transport dependencies — the plugin-facing HTTP layer lives
//! outside this workspace and calls [`RelayService`].
//!
//! # Pipeline
//!
//! 1. **Validate** — reject incomplete requests before any network call
//! 2. **Dedup** — optional name lookup against the owner's creations
//! 3. **Acquire** — download original bytes, or synthesize them from a
//!    structured animation description
//! 4. **Publish** — multipart upload, new id extracted from the response

pub mod dedup;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testutil;

pub use dedup::{DedupOutcome, find_existing};
pub use pipeline::RelayService;
