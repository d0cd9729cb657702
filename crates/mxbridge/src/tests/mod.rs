//! Crate-level test support and BDD tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use mockall::mock;

use crate::adapter::DynamicBean;
use crate::object_name::ObjectName;
use crate::server::{ManagementServer, RegistryError};
use crate::shape::{BeanShape, ManagedBean, Operation, Property, arguments};
use crate::signal::Signal;
use crate::value::{Value, ValueType};

mod behaviour;

mock! {
    pub(crate) Server {}
    impl ManagementServer for Server {
        fn register_bean(
            &self,
            name: ObjectName,
            bean: Arc<dyn DynamicBean>,
        ) -> Result<(), RegistryError>;
        fn unregister_bean(&self, name: &ObjectName) -> Result<(), RegistryError>;
    }
}

/// Bean exercising every member kind.
pub(crate) struct Greeter {
    pub(crate) name: Mutex<String>,
    pub(crate) hits: AtomicI64,
    pub(crate) changed: Signal,
}

impl Greeter {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: Mutex::new(name.to_owned()),
            hits: AtomicI64::new(0),
            changed: Signal::new("changed"),
        }
    }

    fn current_name(&self) -> String {
        self.name.lock().expect("name lock").clone()
    }
}

impl ManagedBean for Greeter {
    fn shape() -> BeanShape<Self> {
        BeanShape::new()
            .with_class_name("tests.Greeter")
            .with_doc("Greets\n  callers")
            .property(
                "name",
                Property::new()
                    .with_getter(Self::current_name)
                    .with_setter(|bean: &Self, value: Value| {
                        let text = value.as_str().ok_or("name must be text")?;
                        *bean.name.lock().expect("name lock") = text.to_owned();
                        Ok(())
                    })
                    .with_doc("Name used in greetings"),
            )
            .typed_property(
                "hits",
                ValueType::LONG,
                Property::new().with_getter(|bean: &Self| bean.hits.load(Ordering::SeqCst)),
            )
            .property(
                "secret",
                Property::new().with_setter(|_: &Self, _: Value| Ok(())),
            )
            .property(
                "_internal",
                Property::new().with_getter(|_: &Self| "hidden"),
            )
            .operation(
                "greet",
                Operation::method(|bean: &Self, args: Vec<Value>| {
                    let [who] = arguments(args)?;
                    bean.hits.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::from(format!("Hello, {who}")))
                })
                .param("who")
                .params([(ValueType::STRING, "who to greet")])
                .returns(ValueType::STRING),
            )
            .operation(
                "touch",
                Operation::method(|bean: &Self, _args| {
                    bean.changed.emit(bean.current_name());
                    Ok(Value::from("ignored"))
                }),
            )
            .operation(
                "fail",
                Operation::method(|_: &Self, _args| Err("boom".into())),
            )
            .operation(
                "mislabelled",
                Operation::method(|_: &Self, _args| Ok(Value::from("abc")))
                    .returns(ValueType::INTEGER),
            )
            .signal("changed", |bean: &Self| &bean.changed)
    }
}
