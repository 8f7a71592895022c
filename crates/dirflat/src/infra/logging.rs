//! Tracing subscriber setup.
//!
//! Logs go to stderr; stdout is reserved for usage text and `Error:` lines.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Pick the effective filter directive.
///
/// `RUST_LOG` wins, then the `-v` count, then the configured level.
fn filter_directive(verbosity: u8, configured: &str) -> String {
    match verbosity {
        0 => configured.trim().to_owned(),
        1 => "info".to_owned(),
        2 => "debug".to_owned(),
        _ => "trace".to_owned(),
    }
}

fn build_filter(verbosity: u8, configured: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = filter_directive(verbosity, configured);
    EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log level '{directive}'"))
}

/// Install the global subscriber. Calling it again is a no-op.
pub fn init(verbosity: u8, configured: &str) -> Result<()> {
    let filter = build_filter(verbosity, configured)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}
