//! Minimal tracing initialisation for tools and one-shot commands.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber, honouring `RUST_LOG` and falling
/// back to `default_level` when it is unset or invalid.
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
