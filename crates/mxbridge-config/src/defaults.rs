use crate::logging::LogFormat;

/// Default log filter expression used by the demo program.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default logging format for the demo program.
pub const DEFAULT_LOG_FORMAT: LogFormat = LogFormat::Compact;

/// Default name the demo bean is registered under.
pub const DEFAULT_REGISTRATION_NAME: &str = "mxbridge:name=demo";

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Owned registration name used where allocation is required.
#[must_use]
pub fn default_registration_name() -> String {
    DEFAULT_REGISTRATION_NAME.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    DEFAULT_LOG_FORMAT
}
