//! Logging infrastructure for the remedy engine.
//!
//! All output goes to stderr so that command results on stdout stay
//! machine-readable.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose events follow the requested verbosity; everything else stays at WARN
const OWN_TARGETS: [&str; 2] = ["remedy_core", "remedy"];

/// Initialize logging from a `-v` count: 0 = warn, 1 = info, 2+ = debug
pub fn init_verbose(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    init_with_level(level)
}

/// Initialize logging with a specific default level for this workspace's crates
///
/// RUST_LOG, when set, replaces the whole directive.
pub fn init_with_level(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive(default_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn directive(level: &str) -> String {
    std::iter::once("warn".to_string())
        .chain(OWN_TARGETS.iter().map(|target| format!("{}={}", target, level)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new(directive("debug")))
        .try_init();
}
