//! Tracing subscriber bootstrap

use once_cell::sync::OnceCell;

static INIT: OnceCell<()> = OnceCell::new();

/// Install the default `tracing` subscriber: formatted output filtered by
/// `RUST_LOG`, falling back to `info`. Safe to call more than once; only
/// the first call has any effect, and an already-installed global
/// subscriber is left in place.
pub fn init() {
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .try_init();
    });
}
