//! Keyframe-sequence encoder.
//!
//! Pure, deterministic translation from a structured animation
//! description to the platform's XML scene document: identical input
//! produces byte-identical output.

pub mod encode;

pub use encode::{BuildError, encode};
