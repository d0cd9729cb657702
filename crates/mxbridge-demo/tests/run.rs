//! Integration tests for the demonstration entry point.

use std::io::{self, BufRead, Cursor, Read};
use std::sync::Arc;

use mxbridge::InMemoryServer;
use mxbridge_config::Config;
use mxbridge_demo::telemetry::{self, TelemetryError};
use mxbridge_demo::{DemoError, run, run_with};
use rstest::rstest;

fn config(args: &[&str]) -> Config {
    let mut argv = vec!["mxbridge-demo"];
    argv.extend_from_slice(args);
    Config::try_from_args(argv).expect("arguments parse")
}

/// Input whose every read fails.
struct BrokenInput;

impl Read for BrokenInput {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("input closed"))
    }
}

impl BufRead for BrokenInput {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Err(io::Error::other("input closed"))
    }

    fn consume(&mut self, _amt: usize) {}
}

#[rstest]
#[case::line("\n")]
#[case::end_of_input("")]
fn run_registers_and_unregisters(#[case] input: &str) {
    let server = Arc::new(InMemoryServer::new());
    let result = run_with(&config(&[]), &server, &mut Cursor::new(input));
    assert!(result.is_ok(), "run failed: {result:?}");
    assert!(server.is_empty());
}

#[test]
fn run_rejects_malformed_registration_name() {
    let err = run(&config(&["--name", "no-properties"]), &mut Cursor::new("\n"))
        .expect_err("malformed names are rejected");
    assert!(matches!(err, DemoError::Adapter(_)), "got {err:?}");
}

#[test]
fn input_failure_still_unregisters_the_bean() {
    let server = Arc::new(InMemoryServer::new());
    let err = run_with(&config(&[]), &server, &mut BrokenInput)
        .expect_err("broken input fails the run");
    assert!(matches!(err, DemoError::Input(_)), "got {err:?}");
    assert!(server.is_empty());
}

#[test]
fn telemetry_keeps_its_first_settings() {
    telemetry::initialise(&config(&[])).expect("default settings install");
    let err = telemetry::initialise(&config(&["--log-format", "json"]))
        .expect_err("format cannot change once installed");
    match err {
        TelemetryError::Reconfigured { active, requested } => {
            assert_eq!(active.format(), mxbridge_config::LogFormat::Compact);
            assert_eq!(requested.format(), mxbridge_config::LogFormat::Json);
        }
        other => panic!("expected a reconfiguration error, got {other:?}"),
    }
}

#[test]
fn invalid_filters_are_rejected() {
    let err = telemetry::initialise(&config(&["--log-filter", "mxbridge=loud"]))
        .expect_err("unknown level");
    assert!(matches!(err, TelemetryError::Filter { .. }), "got {err:?}");
}
