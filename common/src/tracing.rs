use tracing_subscriber::fmt::layer;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Initialize tracing with structured JSON output
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    Registry::default().with(filter).with(layer().json()).init();
}

/// Initialize tracing with pretty output for development
pub fn init_tracing_pretty() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

/// Picks the output format from the `LOG_FORMAT` setting
pub fn init_tracing_for(format: &str) {
    if format.eq_ignore_ascii_case("json") {
        init_tracing();
    } else {
        init_tracing_pretty();
    }
}
