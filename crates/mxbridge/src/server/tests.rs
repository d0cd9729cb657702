//! Unit tests for the in-memory registry.

use rstest::{fixture, rstest};

use super::*;
use crate::adapter::BeanAdapter;
use crate::tests::Greeter;

#[fixture]
fn server() -> Arc<InMemoryServer> {
    Arc::new(InMemoryServer::new())
}

fn name(raw: &str) -> ObjectName {
    ObjectName::parse(raw).expect("valid name")
}

fn greeter(server: &Arc<InMemoryServer>, who: &str) -> Arc<dyn DynamicBean> {
    BeanAdapter::new(Arc::new(Greeter::new(who)), server.clone())
}

#[rstest]
fn registered_beans_are_listed_in_sorted_order(server: Arc<InMemoryServer>) {
    server
        .register_bean(name("d:name=b"), greeter(&server, "B"))
        .expect("register b");
    server
        .register_bean(name("d:name=a"), greeter(&server, "A"))
        .expect("register a");

    assert_eq!(
        server.names().expect("names"),
        vec![name("d:name=a"), name("d:name=b")]
    );
    assert_eq!(server.len(), 2);
    assert!(server.contains(&name("d:name=a")));
}

#[rstest]
fn duplicate_names_are_rejected(server: Arc<InMemoryServer>) {
    server
        .register_bean(name("d:name=a"), greeter(&server, "A"))
        .expect("first registration");
    let err = server
        .register_bean(name("d:name=a"), greeter(&server, "B"))
        .expect_err("duplicate");
    assert_eq!(
        err,
        RegistryError::AlreadyRegistered {
            name: String::from("d:name=a")
        }
    );
}

#[rstest]
fn unknown_names_cannot_be_unregistered(server: Arc<InMemoryServer>) {
    let err = server
        .unregister_bean(&name("d:name=a"))
        .expect_err("unknown");
    assert_eq!(
        err,
        RegistryError::NotRegistered {
            name: String::from("d:name=a")
        }
    );
}

#[rstest]
fn calls_are_routed_by_name(server: Arc<InMemoryServer>) {
    let target = name("d:name=a");
    server
        .register_bean(target.clone(), greeter(&server, "A"))
        .expect("register");

    server
        .set_attribute(&target, Attribute::new("name", "Grace"))
        .expect("write");
    assert_eq!(
        server.get_attribute(&target, "name").expect("read"),
        Value::from("Grace")
    );
    assert_eq!(
        server
            .invoke(&target, "greet", vec![Value::from("you")], &["String"])
            .expect("invoke"),
        Some(Value::from("Hello, you"))
    );
    assert_eq!(
        server.describe(&target).expect("describe").class_name,
        "tests.Greeter"
    );
}

#[rstest]
fn batch_and_notification_calls_are_routed_by_name(server: Arc<InMemoryServer>) {
    let target = name("d:name=a");
    server
        .register_bean(target.clone(), greeter(&server, "A"))
        .expect("register");

    server
        .set_attributes(&target, vec![Attribute::new("name", "Grace")])
        .expect("batch write");
    let read = server
        .get_attributes(&target, &["name", "missing"])
        .expect("batch read");
    assert_eq!(read, vec![Attribute::new("name", "Grace")]);

    let info = server.notification_info(&target).expect("notification info");
    assert_eq!(info.types(), &[String::from("changed")]);
}

#[rstest]
fn routing_to_unknown_names_fails(server: Arc<InMemoryServer>) {
    let err = server
        .get_attribute(&name("d:name=none"), "name")
        .expect_err("unknown bean");
    assert!(matches!(
        err,
        AdapterError::Registry(RegistryError::NotRegistered { .. })
    ));
    assert!(server.subscribe(&name("d:name=none")).is_err());
    assert!(server.notification_info(&name("d:name=none")).is_err());
    assert!(server.get_attributes(&name("d:name=none"), &["name"]).is_err());
}

#[rstest]
fn unregistering_removes_the_bean(server: Arc<InMemoryServer>) {
    let target = name("d:name=a");
    server
        .register_bean(target.clone(), greeter(&server, "A"))
        .expect("register");
    server.unregister_bean(&target).expect("unregister");
    assert!(server.is_empty());
    assert!(server.lookup(&target).is_err());
}
