use tracing_subscriber::EnvFilter;

/// Initialize tracing for the relay.
///
/// `RUST_LOG` wins when set; otherwise `default_level` (from
/// `logging.level`) applies. Later calls are no-ops, so tests may call it
/// freely.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(normalize_level(default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Map a configured level onto one `EnvFilter` understands, defaulting to `info`.
pub fn normalize_level(level: &str) -> &'static str {
    match level.to_lowercase().as_str() {
        "error" => "error",
        "warn" | "warning" => "warn",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    }
}
