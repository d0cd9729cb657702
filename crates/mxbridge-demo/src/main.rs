//! Entry point for the `mxbridge-demo` binary.

use std::io::{self, Write};
use std::process::ExitCode;

use mxbridge_config::Config;

fn main() -> ExitCode {
    let config = Config::from_env();
    match mxbridge_demo::run(&config, &mut io::stdin().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            writeln!(io::stderr().lock(), "mxbridge-demo: {error}").ok();
            ExitCode::FAILURE
        }
    }
}
