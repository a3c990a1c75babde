// src/infra/logger.rs — Structured logging with tracing

use tracing_subscriber::{fmt, EnvFilter};

/// Filter source, most specific first: `SITEINSIGHT_LOG`, `RUST_LOG`, then `level`.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env("SITEINSIGHT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so `analyze` output stays pipeable.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
