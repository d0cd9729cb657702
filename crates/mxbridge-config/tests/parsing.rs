//! Command-line and serde parsing of the shared configuration.

use mxbridge_config::{Config, LogFormat};
use rstest::rstest;
use strum::IntoEnumIterator;

#[test]
fn defaults_apply_without_arguments() {
    let config = Config::try_from_args(["mxbridge-demo"]).expect("parse");
    assert_eq!(config, Config::default());
    assert_eq!(config.log_filter(), "info");
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(config.name(), "mxbridge:name=demo");
}

#[test]
fn flags_override_defaults() {
    let config = Config::try_from_args([
        "mxbridge-demo",
        "--log-filter",
        "mxbridge=debug",
        "--log-format",
        "json",
        "--name",
        "demo:type=Other",
    ])
    .expect("parse");
    assert_eq!(config.log_filter(), "mxbridge=debug");
    assert_eq!(config.log_format(), LogFormat::Json);
    assert_eq!(config.name(), "demo:type=Other");
}

#[rstest]
#[case("json", LogFormat::Json)]
#[case("JSON", LogFormat::Json)]
#[case("compact", LogFormat::Compact)]
#[case("Full", LogFormat::Full)]
fn log_format_parses_case_insensitively(#[case] input: &str, #[case] expected: LogFormat) {
    assert_eq!(input.parse::<LogFormat>(), Ok(expected));
}

#[test]
fn only_json_is_structured() {
    let structured: Vec<LogFormat> = LogFormat::iter()
        .filter(|format| format.is_structured())
        .collect();
    assert_eq!(structured, [LogFormat::Json]);
}

#[test]
fn unknown_log_format_is_rejected() {
    let err = Config::try_from_args(["mxbridge-demo", "--log-format", "pretty"])
        .expect_err("invalid format");
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}

#[test]
fn serde_fills_missing_fields_with_defaults() {
    let config: Config =
        serde_json::from_str(r#"{"log_format":"json"}"#).expect("deserialize");
    assert_eq!(config.log_format(), LogFormat::Json);
    assert_eq!(config.name(), "mxbridge:name=demo");
}
