use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How the demo renders its log events on standard error.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Deserialize,
    Serialize,
    PartialEq,
    Eq,
    EnumString,
    EnumIter,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, fields flattened to the top level.
    Json,
    /// One terse line per event.
    #[default]
    Compact,
    /// One line per event including span context.
    Full,
}

impl LogFormat {
    /// Returns `true` for machine-readable output, which must never carry
    /// terminal colour codes.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Error returned when text names no [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;
