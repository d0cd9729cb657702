//! Log output for the demo program.
//!
//! The subscriber is process-global, so the first call to [`initialise`]
//! installs it and remembers the settings it used. Later calls succeed only
//! when they ask for the same settings.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use mxbridge_config::{Config, LogFormat};

static INSTALLED: OnceCell<TelemetrySettings> = OnceCell::new();

/// Settings the global subscriber runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySettings {
    filter: String,
    format: LogFormat,
}

impl TelemetrySettings {
    /// Extracts the logging settings from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            filter: config.log_filter().to_owned(),
            format: config.log_format(),
        }
    }

    /// Returns the filter directive.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Returns the output format.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The filter directive does not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Rejected directive.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another subscriber was installed outside this module.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
    /// Telemetry is already running with different settings.
    #[error(
        "telemetry already runs with filter '{}' as {}",
        .active.filter(),
        .active.format()
    )]
    Reconfigured {
        /// Settings installed by the first call.
        active: TelemetrySettings,
        /// Settings asked for by this call.
        requested: TelemetrySettings,
    },
}

/// Installs the global subscriber on first use and returns the settings it
/// runs with.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter,
/// [`TelemetryError::Reconfigured`] when an earlier call installed different
/// settings, and [`TelemetryError::Subscriber`] when a foreign subscriber is
/// already installed.
///
/// # Examples
///
/// ```rust
/// use mxbridge_config::Config;
/// use mxbridge_demo::telemetry;
///
/// # fn main() -> Result<(), mxbridge_demo::telemetry::TelemetryError> {
/// let config = Config::default();
/// let active = telemetry::initialise(&config)?;
/// assert_eq!(active.filter(), "info");
/// assert!(telemetry::initialise(&config).is_ok());
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &Config) -> Result<&'static TelemetrySettings, TelemetryError> {
    let requested = TelemetrySettings::from_config(config);
    let filter =
        EnvFilter::try_new(requested.filter()).map_err(|error| TelemetryError::Filter {
            filter: requested.filter().to_owned(),
            message: error.to_string(),
        })?;

    let active = INSTALLED.get_or_try_init(|| {
        install(filter, requested.format())?;
        Ok::<_, TelemetryError>(requested.clone())
    })?;
    if *active == requested {
        Ok(active)
    } else {
        Err(TelemetryError::Reconfigured {
            active: active.clone(),
            requested,
        })
    }
}

fn install(filter: EnvFilter, format: LogFormat) -> Result<(), TelemetryError> {
    let ansi = !format.is_structured() && io::stderr().is_terminal();
    // Thread names tell the notification listener apart from the main thread.
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(ansi)
        .with_thread_names(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match format {
        LogFormat::Json => Box::new(
            builder
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .finish(),
        ),
        LogFormat::Compact => Box::new(builder.compact().finish()),
        LogFormat::Full => Box::new(builder.finish()),
    };
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
