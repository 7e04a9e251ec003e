use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured JSON tracing on stdout. Call once at startup.
///
/// Filtering comes from `RUST_LOG`; when unset, `default_directive` applies
/// (e.g. `"info"` or `"potluck_api=debug,tower_http=info"`).
/// Subsequent calls are silently ignored.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_current_span(false))
        .try_init();
}
