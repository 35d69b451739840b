//! Logging initialization
//!
//! Logs go to stderr so stdout carries only command output. `RUST_LOG`
//! overrides the verbosity flags.

use std::io;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogFormat;

/// Filter directive for a verbosity count
pub fn level_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init(verbose: u8, quiet: bool, format: LogFormat) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(verbose, quiet)));
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Json => subscriber
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init(),
        LogFormat::Text => subscriber
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .try_init(),
    };
    installed.map_err(|e| io::Error::other(e.to_string()))
}
