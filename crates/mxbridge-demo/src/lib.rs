//! Demonstration program for the `mxbridge` adapter.
//!
//! Registers a [`demo_bean::DemoBean`] with an in-process management server,
//! logs every notification it emits, and unregisters it once a line is read
//! from the input.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;

use mxbridge::{AdapterError, BeanAdapter, DynamicBean, InMemoryServer, ManagementServer};
use mxbridge_config::Config;
use tracing::{debug, info};

pub mod demo_bean;
pub mod telemetry;

use demo_bean::DemoBean;
use telemetry::TelemetryError;

const DEMO_TARGET: &str = env!("CARGO_PKG_NAME");

/// Errors raised while running the demonstration.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// Telemetry could not be configured.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// The adapter rejected an operation.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    /// The notification listener thread could not be started.
    #[error("failed to start notification listener: {0}")]
    Listener(#[source] io::Error),
    /// Reading the input failed.
    #[error("failed to read input: {0}")]
    Input(#[from] io::Error),
}

/// Runs the demonstration until a line (or end of input) is read.
///
/// The bean is unregistered before returning, even when serving failed.
///
/// # Errors
///
/// Returns a [`DemoError`] if telemetry, registration, the listener thread,
/// reading the input, or unregistration fails.
pub fn run(config: &Config, input: &mut impl BufRead) -> Result<(), DemoError> {
    run_with(config, &Arc::new(InMemoryServer::new()), input)
}

/// Runs the demonstration against an existing server.
///
/// # Errors
///
/// As [`run`].
pub fn run_with(
    config: &Config,
    server: &Arc<InMemoryServer>,
    input: &mut impl BufRead,
) -> Result<(), DemoError> {
    let telemetry = telemetry::initialise(config)?;
    debug!(
        target: DEMO_TARGET,
        filter = telemetry.filter(),
        format = %telemetry.format(),
        "telemetry ready"
    );

    let adapter = BeanAdapter::new(
        Arc::new(DemoBean::new("Hello, world", 42, true)),
        Arc::clone(server) as Arc<dyn ManagementServer>,
    );
    adapter.register(config.name())?;

    let served = serve(config, &adapter, input);
    let unregistered = adapter.unregister();
    served?;
    unregistered?;
    info!(target: DEMO_TARGET, registered = server.len(), "bean unregistered");
    Ok(())
}

fn serve(
    config: &Config,
    adapter: &BeanAdapter<DemoBean>,
    input: &mut impl BufRead,
) -> Result<(), DemoError> {
    let receiver = adapter.subscribe();
    thread::Builder::new()
        .name(String::from("notifications"))
        .spawn(move || {
            for notification in receiver {
                info!(
                    target: DEMO_TARGET,
                    kind = notification.kind(),
                    source = notification.source(),
                    sequence = notification.sequence(),
                    text = notification.message(),
                    data = notification.user_data(),
                    "notification received"
                );
            }
        })
        .map_err(DemoError::Listener)?;

    let description = adapter.describe()?;
    info!(
        target: DEMO_TARGET,
        name = config.name(),
        class = description.class_name.as_str(),
        attributes = description.attributes.len(),
        operations = description.operations.len(),
        "bean registered; press return to quit"
    );

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(())
}
