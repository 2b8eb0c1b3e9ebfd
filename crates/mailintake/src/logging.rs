//! Tracing subscriber setup.
//!
//! The crate logs through both `log` and `tracing` macros; `LogTracer`
//! forwards `log` records into the tracing subscriber so both end up in the
//! same output. `RUST_LOG` overrides the verbosity-derived filter.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Failed to bridge log records: {0}")]
    LogBridge(#[from] log::SetLoggerError),
}

/// Maps a `-v` count to a default filter directive.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "mailintake=debug,info",
        _ => "mailintake=trace,debug",
    }
}

/// Installs the global subscriber. Call once, early in `main`.
pub fn init_logging(verbosity: u8, format: LogFormat) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }

    tracing_log::LogTracer::init()?;
    Ok(())
}
