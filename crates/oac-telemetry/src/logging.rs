//! Structured logging to stderr.
//!
//! Stdout stays free for command output; every event goes to stderr, either
//! as flattened JSON or in the pretty format.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// `RUST_LOG` wins over the configured level when it is set and valid.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter),
    }
}

fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::LoggingInit(format!("invalid log level '{}': {e}", config.log_level)))
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// A root document and its references were loaded.
    pub const SPEC_LOADED: &str = "spec_loaded";

    /// A document passed validation.
    pub const SPEC_VALIDATED: &str = "spec_validated";

    /// An output file was written.
    pub const ARTIFACT_WRITTEN: &str = "artifact_written";

    /// A documentation file or directory was synchronized.
    pub const FILE_SYNCED: &str = "file_synced";

    /// Converting one input failed.
    pub const CONVERSION_FAILED: &str = "conversion_failed";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_spec_loaded {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::SPEC_LOADED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_spec_validated {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::SPEC_VALIDATED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_artifact_written {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::ARTIFACT_WRITTEN,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_file_synced {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::FILE_SYNCED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_conversion_failed {
    ($($field:tt)*) => {
        tracing::error!(
            event = $crate::logging::events::CONVERSION_FAILED,
            $($field)*
        )
    };
}
