//! A demonstration bean exercising every kind of member.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use mxbridge::shape::arguments;
use mxbridge::{
    BeanError, BeanShape, Declaration, ManagedBean, Operation, Property, ScalarType, Signal,
    Value, ValueType,
};
use tracing::info;

const DEMO_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bean");

/// Crates making up the workspace, published through `modules`.
pub const WORKSPACE_CRATES: [&str; 3] = ["mxbridge", "mxbridge-config", "mxbridge-demo"];

/// A demonstration bean.
#[derive(Debug)]
pub struct DemoBean {
    str_value: Mutex<String>,
    int_value: i32,
    bool_value: AtomicBool,
    test: Signal,
    test2: Signal,
}

impl DemoBean {
    /// Creates the bean with initial attribute values.
    #[must_use]
    pub fn new(str_value: impl Into<String>, int_value: i32, bool_value: bool) -> Self {
        Self {
            str_value: Mutex::new(str_value.into()),
            int_value,
            bool_value: AtomicBool::new(bool_value),
            test: Signal::new("test"),
            test2: Signal::new("test2"),
        }
    }

    fn str_value(&self) -> Result<Value, BeanError> {
        let text = self.str_value.lock().map_err(|_| "string value lock poisoned")?;
        Ok(Value::from(text.as_str()))
    }

    fn set_str_value(&self, value: Value) -> Result<(), BeanError> {
        let replacement = match value {
            Value::String(text) => text,
            other => other.to_string(),
        };
        let mut text = self.str_value.lock().map_err(|_| "string value lock poisoned")?;
        *text = replacement;
        Ok(())
    }

    fn set_bool_value(&self, value: Value) -> Result<(), BeanError> {
        let flag = ScalarType::Boolean
            .coerce(value)?
            .as_bool()
            .ok_or("boolValue cannot be null")?;
        self.bool_value.store(flag, Ordering::SeqCst);
        Ok(())
    }

    fn notify_test(&self) {
        self.test.emit("Test succeeded");
        // User data must be text, e.g. machine-readable information.
        self.test2.emit_with("Test really succeeded", "With user data");
    }
}

/// Returns `true` when `b` divides `a` without remainder; never for zero.
#[must_use]
pub const fn divides(a: i32, b: i32) -> bool {
    b != 0 && a.wrapping_rem(b) == 0
}

fn integer(value: Value) -> Result<i32, BeanError> {
    match ScalarType::Integer.coerce(value)? {
        Value::Integer(number) => Ok(number),
        _ => Err("expected an integer".into()),
    }
}

impl ManagedBean for DemoBean {
    fn shape() -> BeanShape<Self> {
        BeanShape::new()
            .with_class_name("mxbridge.demo.DemoBean")
            .with_doc("A demonstration bean")
            .property(
                "strValue",
                Property::new()
                    .with_try_getter(Self::str_value)
                    .with_setter(Self::set_str_value)
                    .with_doc("A string value"),
            )
            .typed_property(
                "intValue",
                ScalarType::Integer,
                Property::new()
                    .with_getter(|bean: &Self| bean.int_value)
                    .with_doc("A read-only integer value"),
            )
            .typed_property(
                "boolValue",
                ScalarType::Boolean,
                Property::new()
                    .with_getter(|bean: &Self| bean.bool_value.load(Ordering::SeqCst))
                    .with_setter(Self::set_bool_value),
            )
            .typed_property(
                "modules",
                ValueType::array_of(ScalarType::String),
                Property::new()
                    .with_getter(|_: &Self| WORKSPACE_CRATES.to_vec())
                    .with_doc("List of all workspace crates"),
            )
            .operation(
                "hello",
                Operation::method(|_: &Self, args: Vec<Value>| {
                    let [name] = arguments(args)?;
                    Ok(Value::from(format!("Hello, {name}")))
                })
                .param("name")
                .params([(ScalarType::String, "User name")])
                .returns(ScalarType::String)
                .with_doc("A method saying hello"),
            )
            .operation(
                "demo",
                Operation::method(|_: &Self, _args| {
                    info!(target: DEMO_TARGET, "demo called");
                    Ok(Value::Null)
                })
                .with_doc("A demo function which only logs"),
            )
            .operation(
                "divides",
                Operation::method(|_: &Self, args: Vec<Value>| {
                    let [a, b] = arguments(args)?;
                    Ok(Value::from(divides(integer(a)?, integer(b)?)))
                })
                .param("a")
                .param("b")
                .params([
                    Declaration::from((ScalarType::Integer, "Dividend")),
                    Declaration::from(ScalarType::Integer),
                ])
                .returns(ScalarType::Boolean)
                .with_doc("Check whether b is a whole divisor of a"),
            )
            .operation(
                "notifyTest",
                Operation::method(|bean: &Self, _args| {
                    bean.notify_test();
                    Ok(Value::Null)
                })
                .with_doc("A function which emits both test notifications"),
            )
            .signal("test", |bean: &Self| &bean.test)
            .signal("test2", |bean: &Self| &bean.test2)
    }
}
