//! Diagnostic logging setup.
//!
//! Diagnostics go to stderr so that `list --json` output on stdout stays
//! machine readable. The filter comes from `-v`/`-q` when given, otherwise
//! from `GZCARVE_LOG`, otherwise `warn`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "GZCARVE_LOG";

/// Filter directive for the given verbosity flags, if the flags pick one.
pub fn level_directive(verbose: u8, quiet: bool) -> Option<&'static str> {
    if quiet {
        return Some("error");
    }
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Build the filter for the given verbosity flags.
pub fn build_filter(verbose: u8, quiet: bool) -> EnvFilter {
    match level_directive(verbose, quiet) {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
    }
}

/// Install the global subscriber. Does nothing if one is already installed.
pub fn init(verbose: u8, quiet: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
