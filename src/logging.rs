//! Tracing setup for the `codemin` binary.
//!
//! `CODEMIN_LOG` takes precedence over `RUST_LOG`; both use the `RUST_LOG`
//! syntax (`debug`, `codemin::scanner=trace`). Without either, the level
//! comes from the number of `-v` flags. Output goes to stderr so minified
//! text on stdout stays clean.

use tracing_subscriber::EnvFilter;

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn build_filter(verbosity: u8) -> EnvFilter {
    if let Ok(val) = std::env::var("CODEMIN_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_directive(verbosity))
    }
}

/// Initialise the global subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
