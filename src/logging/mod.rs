// Logging module for structured logging using the tracing crate

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber writes to stderr so rendered images piped through stdout
/// stay intact. The filter comes from `RUST_LOG` when it is set, otherwise
/// from the configured level. With `json` enabled every event is one JSON
/// object per line.
///
/// Calling this more than once is harmless: when a global subscriber is
/// already installed the call returns `Ok(())` and leaves it in place.
///
/// # Errors
///
/// Returns an error if the configured level is not a valid filter directive.
///
/// # Examples
///
/// ```
/// use textmark::config::LoggingConfig;
/// use textmark::logging::init_subscriber;
///
/// init_subscriber(&LoggingConfig::default()).expect("Failed to initialize logging");
///
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    // A subscriber installed earlier (by a test harness or the host
    // application) stays in charge.
    if let Err(e) = result {
        tracing::debug!(error = %e, "Keeping existing tracing subscriber");
    }

    Ok(())
}
