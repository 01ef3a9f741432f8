use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global fmt subscriber
///
/// `RUST_LOG` wins over `default_filter` when set. Calling this more than
/// once is harmless; later calls return `false`.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
