//! Behaviour-driven tests for the adapter lifecycle.

use std::sync::{Arc, mpsc};
use std::time::Duration;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::adapter::{BeanAdapter, DynamicBean};
use crate::error::AdapterError;
use crate::object_name::ObjectName;
use crate::server::InMemoryServer;
use crate::signal::Notification;

use super::Greeter;

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TestWorld {
    server: Arc<InMemoryServer>,
    adapter: Option<Arc<BeanAdapter<Greeter>>>,
    receiver: Option<mpsc::Receiver<Notification>>,
    outcome: Option<Result<(), AdapterError>>,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn adapter(world: &TestWorld) -> &Arc<BeanAdapter<Greeter>> {
    world.adapter.as_ref().expect("no greeter created")
}

fn object_name(raw: &str) -> ObjectName {
    ObjectName::parse(raw.trim_matches('"')).expect("valid object name")
}

fn outcome(world: &TestWorld) -> &Result<(), AdapterError> {
    world.outcome.as_ref().expect("no call recorded")
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a greeter named {name}")]
fn given_greeter(world: &mut TestWorld, name: String) {
    let greeter = Arc::new(Greeter::new(name.trim_matches('"')));
    world.adapter = Some(BeanAdapter::new(greeter, world.server.clone()));
}

#[given("a subscriber")]
fn given_subscriber(world: &mut TestWorld) {
    world.receiver = Some(adapter(world).subscribe());
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the adapter is registered as {name}")]
fn when_registered(world: &mut TestWorld, name: String) {
    let result = adapter(world).register(name.trim_matches('"'));
    world.outcome = Some(result);
}

#[when("the adapter is unregistered")]
fn when_unregistered(world: &mut TestWorld) {
    let result = adapter(world).unregister();
    world.outcome = Some(result);
}

#[when("operation {name} is invoked")]
fn when_invoked(world: &mut TestWorld, name: String) {
    let result = adapter(world)
        .invoke(name.trim_matches('"'), Vec::new(), &[])
        .map(|_| ());
    world.outcome = Some(result);
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the registry lists {name}")]
fn then_registry_lists(world: &mut TestWorld, name: String) {
    let expected = object_name(&name);
    let names = world.server.names().expect("registry readable");
    assert_eq!(names, vec![expected]);
}

#[then("the registry is empty")]
fn then_registry_empty(world: &mut TestWorld) {
    assert!(world.server.is_empty());
    assert!(!adapter(world).is_registered());
}

#[then("reading {attribute} through the registry yields {value}")]
fn then_registry_read(world: &mut TestWorld, attribute: String, value: String) {
    let name = adapter(world)
        .registration_name()
        .expect("adapter registered");
    let read = world
        .server
        .get_attribute(&name, attribute.trim_matches('"'))
        .expect("attribute readable");
    assert_eq!(read.to_string(), value.trim_matches('"'));
}

#[then("the last call succeeds")]
fn then_succeeds(world: &mut TestWorld) {
    if let Err(err) = outcome(world) {
        panic!("expected success, got: {err}");
    }
}

#[then("the last call fails with {error_kind}")]
fn then_fails(world: &mut TestWorld, error_kind: String) {
    let err = outcome(world)
        .as_ref()
        .expect_err("expected error but got success");
    match error_kind.trim_matches('"') {
        "state_conflict" => assert!(
            matches!(err, AdapterError::StateConflict { .. }),
            "expected StateConflict, got: {err}"
        ),
        "not_found" => assert!(err.is_not_found(), "expected NotFound, got: {err}"),
        other => panic!("unsupported error kind: '{other}' (supported: state_conflict, not_found)"),
    }
}

#[then("the subscriber receives a {kind} notification with message {message}")]
fn then_notified(world: &mut TestWorld, kind: String, message: String) {
    let receiver = world.receiver.as_ref().expect("no subscriber");
    let notification = receiver
        .recv_timeout(Duration::from_secs(1))
        .expect("notification delivered");
    assert_eq!(notification.kind(), kind.trim_matches('"'));
    assert_eq!(notification.message(), Some(message.trim_matches('"')));
    assert_eq!(notification.source(), "Greeter");
    assert_eq!(notification.sequence(), 1);
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/adapter_lifecycle.feature")]
fn adapter_lifecycle_behaviour(world: TestWorld) {
    let _ = world;
}
