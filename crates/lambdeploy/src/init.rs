// Logging setup for the CLI

use lambdeploy_config::{LogConfig, LogFormat};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber, writing to stderr so stdout carries only
/// the outcome summary.
///
/// An explicit `--log-level` wins over `RUST_LOG`, which wins over the config
/// file level.
pub(crate) fn init_tracing(log: &LogConfig, level_from_cli: bool) {
    let env_filter = filter(log, level_from_cli);
    let registry = tracing_subscriber::registry().with(env_filter);

    // Ignore the error if a subscriber is already set
    let _ = match log.format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().with_writer(std::io::stderr)),
        ),
        LogFormat::Text => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().with_target(false).with_writer(std::io::stderr)),
        ),
    };
}

fn filter(log: &LogConfig, level_from_cli: bool) -> EnvFilter {
    if !level_from_cli {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
    }
    EnvFilter::try_new(&log.level).unwrap_or_else(|_| EnvFilter::new("info"))
}
