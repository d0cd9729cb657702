//! Management bridge for plain Rust types.
//!
//! The `mxbridge` crate exposes an ordinary value to a management registry
//! without the value knowing anything about the protocol. A bean type
//! declares its surface once through a [`BeanShape`]: attributes backed by
//! getters and setters, operations tagged with parameter and return types,
//! and notification channels. A [`BeanAdapter`] compiles that shape into a
//! [`CompiledDescription`] on first use and then serves the protocol calls
//! of [`DynamicBean`], coercing values across the boundary and turning
//! failures into [`AdapterError`]s.
//!
//! # Architecture
//!
//! - [`value`] holds the protocol values and their coercions.
//! - [`metadata`] attaches return and parameter type declarations.
//! - [`shape`] declares a bean's properties, operations and signals.
//! - [`signal`] implements per-instance notification channels.
//! - [`compiler`] validates a shape and builds its description.
//! - [`adapter`] dispatches protocol calls onto the bean.
//! - [`server`] defines the host registry and an in-memory registry.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use mxbridge::{
//!     BeanAdapter, BeanShape, DynamicBean, InMemoryServer, ManagedBean, Operation, Value, ValueType,
//! };
//! use mxbridge::shape::arguments;
//!
//! struct Calculator;
//!
//! impl ManagedBean for Calculator {
//!     fn shape() -> BeanShape<Self> {
//!         BeanShape::new().operation(
//!             "add",
//!             Operation::method(|_: &Self, args: Vec<Value>| {
//!                 let [a, b] = arguments(args)?;
//!                 let sum = a.as_i64().unwrap_or_default() + b.as_i64().unwrap_or_default();
//!                 Ok(Value::from(sum))
//!             })
//!             .param("a")
//!             .param("b")
//!             .params([ValueType::LONG, ValueType::LONG])
//!             .returns(ValueType::LONG),
//!         )
//!     }
//! }
//!
//! let server = Arc::new(InMemoryServer::new());
//! let adapter = BeanAdapter::new(Arc::new(Calculator), server);
//! adapter.register("demo:name=calculator")?;
//! let sum = adapter.invoke("add", vec![Value::from(2), Value::from(3)], &[])?;
//! assert_eq!(sum, Some(Value::Long(5)));
//! # Ok::<(), mxbridge::AdapterError>(())
//! ```

pub mod adapter;
pub mod compiler;
pub mod error;
pub mod metadata;
pub mod object_name;
pub mod server;
pub mod shape;
pub mod signal;
pub mod value;

#[cfg(test)]
mod tests;

pub use self::adapter::{Attribute, AttributeList, BeanAdapter, DynamicBean};
pub use self::compiler::{
    AttributeDescriptor, CompiledDescription, OperationDescriptor, ParameterDescriptor,
};
pub use self::error::{AdapterError, BeanError, MemberKind, ValidationError};
pub use self::metadata::{DECLARE_PARAMS, DECLARE_RETURN, Declaration, Tag, Tagger};
pub use self::object_name::{ObjectName, ObjectNameError};
pub use self::server::{InMemoryServer, ManagementServer, RegistryError};
pub use self::shape::{BeanShape, ManagedBean, Operation, Property};
pub use self::signal::{Notification, NotificationInfo, Signal};
pub use self::value::{ArrayType, ArrayValue, ScalarType, Value, ValueType};
