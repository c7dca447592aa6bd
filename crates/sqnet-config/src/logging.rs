//! Tracing subscriber setup from [`LoggingConfig`].

use std::io;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::LoggingConfig;

/// Build the filter directive string from the base level and per-module filters.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.as_deref().unwrap_or("info").to_string();
    let mut modules: Vec<_> = config.filters.iter().collect();
    modules.sort();
    for (module, level) in modules {
        filter_str.push(',');
        filter_str.push_str(module);
        filter_str.push('=');
        filter_str.push_str(level);
    }
    filter_str
}

/// Initialize the global tracing subscriber.
///
/// Supports:
/// - `level`: Base log level (trace, debug, info, warn, error)
/// - `format`: Output format (json, pretty, compact). Default: pretty
/// - `output`: Output target (stdout, stderr). Default: stderr
/// - `filters`: Per-module log level overrides
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(filter_directives(config))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = config.format.as_deref().unwrap_or("pretty");
    let output = config.output.as_deref().unwrap_or("stderr");

    let registry = tracing_subscriber::registry().with(filter);
    match (format, output) {
        ("json", "stdout") => registry.with(fmt::layer().json().with_writer(io::stdout)).init(),
        ("json", _) => registry.with(fmt::layer().json().with_writer(io::stderr)).init(),
        ("compact", "stdout") => registry
            .with(fmt::layer().compact().with_writer(io::stdout))
            .init(),
        ("compact", _) => registry
            .with(fmt::layer().compact().with_writer(io::stderr))
            .init(),
        (_, "stdout") => registry.with(fmt::layer().with_writer(io::stdout)).init(),
        _ => registry.with(fmt::layer().with_writer(io::stderr)).init(),
    }
}
