//! Logging and tracing bootstrap.

use anyhow::Context;
use bookstore_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the configured level. Installing twice is not
/// an error; the first subscriber stays in place.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = build_filter(settings)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = match settings.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    match installed {
        Ok(()) => tracing::info!(
            target: "bookstore-telemetry",
            format = ?settings.log_format,
            level = %settings.log_level,
            "telemetry initialized"
        ),
        Err(err) => tracing::debug!(
            target: "bookstore-telemetry",
            error = %err,
            "tracing subscriber already installed"
        ),
    }

    Ok(())
}

fn build_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(format!("{},sqlx=warn", settings.log_level))
            .with_context(|| format!("invalid log level '{}'", settings.log_level)),
    }
}
