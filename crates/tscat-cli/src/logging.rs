use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TSCAT_LOG";

/// Installs the stderr subscriber. `TSCAT_LOG` wins over the configured
/// directives. Later calls are no-ops.
pub fn init(configured: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(configured))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(configured))
}
