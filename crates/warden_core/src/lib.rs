//! Ambient infrastructure shared by the orchestration crates.
//!
//! `warden_core` carries the concerns that are not specific to any one
//! component of the engine: an opt-in `tracing` subscriber for binaries and
//! tests, and the cooperative [`retry`](retry::retry) helper exposed to
//! operation implementations.

/// Cooperative retry helper for operation implementations.
pub mod retry;

/// Optional `tracing-subscriber` setup.
pub mod telemetry;

pub use retry::{retry, RetryError, RetryExhausted};
pub use telemetry::init_tracing;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::retry::{retry, RetryError, RetryExhausted};
    pub use crate::telemetry::init_tracing;
}
