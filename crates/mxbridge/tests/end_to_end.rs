//! End-to-end checks of a bean served through the in-memory registry.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::thread;

use mxbridge::shape::arguments;
use mxbridge::{
    AdapterError, Attribute, BeanAdapter, BeanShape, DynamicBean, InMemoryServer, ManagedBean,
    ObjectName, Operation, Property, Signal, Value, ValueType,
};
use rstest::{fixture, rstest};

struct Person {
    name: Mutex<String>,
    a: Mutex<Value>,
    tags: Vec<&'static str>,
    renamed: Signal,
    pinged: Signal,
}

impl Person {
    fn new() -> Self {
        Self {
            name: Mutex::new(String::from("nobody")),
            a: Mutex::new(Value::Null),
            tags: vec!["x", "y"],
            renamed: Signal::new("renamed"),
            pinged: Signal::new("pinged"),
        }
    }
}

impl ManagedBean for Person {
    fn shape() -> BeanShape<Self> {
        BeanShape::new()
            .with_class_name("e2e.Person")
            .property(
                "name",
                Property::new()
                    .with_getter(|bean: &Self| bean.name.lock().expect("name lock").clone())
                    .with_setter(|bean: &Self, value: Value| {
                        let text = value.to_string();
                        *bean.name.lock().expect("name lock") = text.clone();
                        bean.renamed.emit(text);
                        Ok(())
                    }),
            )
            .property(
                "a",
                Property::new()
                    .with_getter(|bean: &Self| bean.a.lock().expect("a lock").clone())
                    .with_setter(|bean: &Self, value: Value| {
                        *bean.a.lock().expect("a lock") = value;
                        Ok(())
                    }),
            )
            .typed_property(
                "tags",
                ValueType::array_of(ValueType::STRING),
                Property::new().with_getter(|bean: &Self| bean.tags.clone()),
            )
            .operation(
                "greet",
                Operation::method(|_: &Self, args: Vec<Value>| {
                    let [who] = arguments(args)?;
                    Ok(Value::from(format!("Hello, {who}")))
                })
                .param("who")
                .params([ValueType::STRING])
                .returns(ValueType::STRING),
            )
            .operation(
                "ping",
                Operation::method(|bean: &Self, _args| {
                    bean.pinged.emit("pong");
                    Ok(Value::Null)
                }),
            )
            .signal("renamed", |bean: &Self| &bean.renamed)
            .signal("pinged", |bean: &Self| &bean.pinged)
    }
}

struct Served {
    server: Arc<InMemoryServer>,
    adapter: Arc<BeanAdapter<Person>>,
    name: ObjectName,
}

#[fixture]
fn served() -> Served {
    let server = Arc::new(InMemoryServer::new());
    let adapter = BeanAdapter::new(Arc::new(Person::new()), server.clone());
    adapter.register("e2e:type=Person").expect("registration");
    let name = ObjectName::parse("e2e:type=Person").expect("valid name");
    Served {
        server,
        adapter,
        name,
    }
}

#[rstest]
fn written_name_reads_back(served: Served) {
    served
        .server
        .set_attribute(&served.name, Attribute::new("name", "x"))
        .expect("write");
    assert_eq!(
        served.server.get_attribute(&served.name, "name").expect("read"),
        Value::from("x")
    );
}

#[rstest]
fn greet_says_hello(served: Served) {
    let greeting = served
        .server
        .invoke(&served.name, "greet", vec![Value::from("world")], &["String"])
        .expect("invoke");
    assert_eq!(greeting, Some(Value::from("Hello, world")));
}

#[rstest]
fn missing_attribute_is_not_found(served: Served) {
    let err = served
        .server
        .get_attribute(&served.name, "missing")
        .expect_err("missing attribute");
    assert!(matches!(err, AdapterError::NotFound { .. }));
}

#[rstest]
fn batch_read_drops_unknown_names(served: Served) {
    let attributes = served
        .adapter
        .get_attributes(&["name", "missing"])
        .expect("batch read");
    let names: Vec<&str> = attributes.iter().map(Attribute::name).collect();
    assert_eq!(names, ["name"]);
}

#[rstest]
fn batch_write_keeps_writes_before_the_failure(served: Served) {
    let err = served
        .adapter
        .set_attributes(vec![Attribute::new("a", 1), Attribute::new("bad", 2)])
        .expect_err("unknown attribute");
    assert!(err.is_not_found());
    assert_eq!(
        served.adapter.get_attribute("a").expect("read"),
        Value::from("1")
    );
}

#[rstest]
fn array_attribute_is_coerced_element_wise(served: Served) {
    let tags = served.adapter.get_attribute("tags").expect("read");
    let array = tags.as_array().expect("array value");
    assert_eq!(array.len(), 2);
    assert_eq!(array.element_type(), Some(&ValueType::STRING));
    let description = served.adapter.describe().expect("description");
    let descriptor = description.attribute("tags").expect("tags described");
    assert_eq!(descriptor.value_type.name(), "String[]");
}

#[rstest]
fn description_serializes_for_transport(served: Served) {
    let description = served.adapter.describe().expect("description");
    let json = serde_json::to_value(description.as_ref()).expect("serialize");
    assert_eq!(json["class_name"], "e2e.Person");
    assert_eq!(json["operations"][0]["impact"], "ACTION");
    assert_eq!(
        json["notification_info"]["types"],
        serde_json::json!(["renamed", "pinged"])
    );
}

#[rstest]
fn channels_share_one_sequence(served: Served) {
    let receiver = served.server.subscribe(&served.name).expect("subscribe");

    served
        .adapter
        .set_attribute(Attribute::new("name", "Ada"))
        .expect("write");
    served
        .adapter
        .invoke("ping", Vec::new(), &[])
        .expect("ping");

    let delivered: Vec<(String, u64)> = receiver
        .try_iter()
        .map(|notification| (notification.kind().to_owned(), notification.sequence()))
        .collect();
    assert_eq!(
        delivered,
        vec![(String::from("renamed"), 1), (String::from("pinged"), 2)]
    );
}

#[rstest]
fn concurrent_emissions_draw_unique_sequence_numbers(served: Served) {
    let receiver = served.adapter.subscribe();
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let adapter = Arc::clone(&served.adapter);
            thread::spawn(move || {
                (0..25)
                    .map(|_| {
                        adapter
                            .send_notification("pinged", "load", Value::Null)
                            .expect("send")
                    })
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let mut drawn = BTreeSet::new();
    for worker in workers {
        for sequence in worker.join().expect("worker finished") {
            assert!(drawn.insert(sequence), "duplicate sequence {sequence}");
        }
    }
    assert_eq!(drawn.len(), 100);
    assert_eq!(receiver.try_iter().count(), 100);
}

#[rstest]
fn unregistering_removes_the_bean(served: Served) {
    served.adapter.unregister().expect("unregister");
    assert!(served.server.is_empty());
    let err = served.adapter.unregister().expect_err("already unregistered");
    assert!(matches!(err, AdapterError::StateConflict { .. }));
}
