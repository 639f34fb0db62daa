//! Shared types for the asset re-publication relay.
//!
//! Everything that crosses a boundary lives here: the request/outcome
//! shapes exchanged with the plugin-facing transport, the structured
//! animation description, the persisted startup config, and the
//! process-wide constants (timeouts, defaults, client identifier).

pub mod animation;
pub mod config;
pub mod constants;
pub mod types;

// Re-export primary types for convenience.
pub use animation::{AnimationPayload, Keyframe, Pose};
pub use config::{ConfigError, RelayConfig};
pub use types::{AssetRequest, AuthMode, OutcomeRecord, OutcomeStatus, PingResponse};
