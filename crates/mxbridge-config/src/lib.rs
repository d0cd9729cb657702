//! Shared configuration for the mxbridge binaries.
//!
//! [`Config`] is parsed from the command line with `clap` and can also be
//! deserialized with `serde`, falling back to the defaults in [`defaults`]
//! for any missing field.

/// Default values shared by the binaries.
pub mod defaults;
/// Logging format selection.
pub mod logging;

use std::ffi::OsString;

use clap::Parser;
use serde::{Deserialize, Serialize};

pub use self::defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_LOG_FORMAT, DEFAULT_REGISTRATION_NAME, default_log_filter,
    default_log_format, default_registration_name,
};
pub use self::logging::{LogFormat, LogFormatParseError};

/// Runtime configuration of the demo program.
#[derive(Parser, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[command(name = "mxbridge-demo", about = "Expose a demo bean through mxbridge")]
#[serde(default)]
pub struct Config {
    /// Tracing filter directive, e.g. `info` or `mxbridge=debug`.
    #[arg(long, default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,
    /// Log output format (`json` or `compact`).
    #[arg(long, default_value_t = DEFAULT_LOG_FORMAT)]
    log_format: LogFormat,
    /// Name the demo bean is registered under.
    #[arg(long, default_value = DEFAULT_REGISTRATION_NAME)]
    name: String,
}

impl Config {
    /// Parses configuration from the process arguments.
    ///
    /// Exits the process with usage information on invalid input, as
    /// `clap` does.
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse()
    }

    /// Parses configuration from explicit arguments; the first item is the
    /// program name.
    ///
    /// # Errors
    ///
    /// Returns the `clap` error describing invalid or unknown arguments.
    pub fn try_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// Returns the tracing filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the registration name of the demo bean.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            log_format: default_log_format(),
            name: default_registration_name(),
        }
    }
}
