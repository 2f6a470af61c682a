use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber for the crate's `tracing` events.
///
/// Respects `RUST_LOG` and falls back to `info` when it is unset or invalid.
/// Returns `false` if a global subscriber was already installed, so repeated
/// calls (one per test, say) are harmless.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
