//! Optional tracing subscriber setup for binaries and tests.
//!
//! Library crates in this workspace never install a global subscriber
//! themselves — only [`init_tracing`] does, and only when a caller opts in.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing-subscriber` `fmt` layer filtered by the `WARDEN_LOG`
/// environment variable (falling back to `info` when unset).
///
/// Intended for binaries and integration tests; library crates log through
/// `tracing` spans/events without assuming a subscriber is present.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("WARDEN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .expect("tracing subscriber already installed");
}
