//! Tracing setup for hosts embedding the session core.
//!
//! The crate itself only emits through `tracing` macros; a host that wants to
//! see those events can call [`init`] once at startup, or install its own
//! subscriber instead.

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
