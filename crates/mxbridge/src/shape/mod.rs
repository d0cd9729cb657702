//! Static declarations of a bean's exposed surface.
//!
//! A bean type implements [`ManagedBean`] and returns a [`BeanShape`]
//! listing its properties, operations, and notification channels. The shape
//! is built once per adapter and stands in for runtime reflection: the
//! compiler walks its members, and the adapter dispatches through the
//! getters, setters, and handlers it holds.
//!
//! # Example
//!
//! ```
//! use std::sync::Mutex;
//!
//! use mxbridge::shape::{BeanShape, ManagedBean, Operation, Property};
//! use mxbridge::value::{Value, ValueType};
//!
//! struct Greeter {
//!     name: Mutex<String>,
//! }
//!
//! impl ManagedBean for Greeter {
//!     fn shape() -> BeanShape<Self> {
//!         BeanShape::new()
//!             .with_doc("Says hello")
//!             .property(
//!                 "name",
//!                 Property::new().with_getter(|bean: &Self| {
//!                     bean.name.lock().map(|name| name.clone()).unwrap_or_default()
//!                 }),
//!             )
//!             .operation(
//!                 "greet",
//!                 Operation::method(|_bean: &Self, args: Vec<Value>| {
//!                     let [who] = mxbridge::shape::arguments(args)?;
//!                     Ok(Value::from(format!("Hello, {who}")))
//!                 })
//!                 .param("who")
//!                 .params([ValueType::STRING])
//!                 .returns(ValueType::STRING),
//!             )
//!     }
//! }
//!
//! assert_eq!(Greeter::shape().len(), 2);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::BeanError;
use crate::metadata::{self, Declaration, MetadataTable, Tag, Tagged};
use crate::signal::Signal;
use crate::value::{Value, ValueType};

/// Reads an attribute from a bean.
pub type Getter<T> = Arc<dyn Fn(&T) -> Result<Value, BeanError> + Send + Sync>;

/// Writes an attribute on a bean.
pub type Setter<T> = Arc<dyn Fn(&T, Value) -> Result<(), BeanError> + Send + Sync>;

/// Invokes an instance method with positional arguments.
pub type MethodFn<T> = Arc<dyn Fn(&T, Vec<Value>) -> Result<Value, BeanError> + Send + Sync>;

/// Invokes a function that takes no receiver.
pub type FunctionFn = Arc<dyn Fn(Vec<Value>) -> Result<Value, BeanError> + Send + Sync>;

/// Reaches the signal owned by a bean instance.
pub type SignalAccessor<T> = Arc<dyn Fn(&T) -> &Signal + Send + Sync>;

/// A type whose instances can be exposed through an adapter.
pub trait ManagedBean: Send + Sync + Sized + 'static {
    /// Declares the exposed surface of the type.
    fn shape() -> BeanShape<Self>;
}

/// A readable and/or writable attribute.
pub struct Property<T> {
    getter: Option<Getter<T>>,
    setter: Option<Setter<T>>,
    doc: Option<String>,
}

impl<T> Property<T> {
    /// Creates a property with neither getter nor setter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            getter: None,
            setter: None,
            doc: None,
        }
    }

    /// Sets an infallible getter.
    #[must_use]
    pub fn with_getter<F, V>(self, getter: F) -> Self
    where
        F: Fn(&T) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.with_try_getter(move |bean| Ok(getter(bean).into()))
    }

    /// Sets a getter that may fail.
    #[must_use]
    pub fn with_try_getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&T) -> Result<Value, BeanError> + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(getter));
        self
    }

    /// Sets the setter. The setter receives values exactly as written.
    #[must_use]
    pub fn with_setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&T, Value) -> Result<(), BeanError> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    /// Sets the documentation.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Returns the getter, if any.
    #[must_use]
    pub const fn getter(&self) -> Option<&Getter<T>> {
        self.getter.as_ref()
    }

    /// Returns the setter, if any.
    #[must_use]
    pub const fn setter(&self) -> Option<&Setter<T>> {
        self.setter.as_ref()
    }

    /// Returns the documentation, if any.
    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
}

impl<T> Default for Property<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("readable", &self.getter.is_some())
            .field("writable", &self.setter.is_some())
            .field("doc", &self.doc)
            .finish()
    }
}

/// A property with an explicit value type.
///
/// Plain properties are published as strings; a typed property overrides
/// that with its own type. The type cannot change after construction.
pub struct TypedProperty<T> {
    value_type: ValueType,
    property: Property<T>,
}

impl<T> TypedProperty<T> {
    /// Attaches `value_type` to a property.
    #[must_use]
    pub fn new(value_type: impl Into<ValueType>, property: Property<T>) -> Self {
        Self {
            value_type: value_type.into(),
            property,
        }
    }

    /// Returns the declared value type.
    #[must_use]
    pub const fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// Returns the wrapped property.
    #[must_use]
    pub const fn property(&self) -> &Property<T> {
        &self.property
    }
}

impl<T> fmt::Debug for TypedProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedProperty")
            .field("value_type", &self.value_type)
            .field("property", &self.property)
            .finish()
    }
}

/// How a callable is bound.
pub enum Callable<T> {
    /// An instance method receiving the bean.
    Instance(MethodFn<T>),
    /// A free function attached to the type.
    Static(FunctionFn),
    /// A function bound to the type rather than an instance.
    ClassBound(FunctionFn),
}

impl<T> Callable<T> {
    /// Returns the binding as a string.
    #[must_use]
    pub const fn binding(&self) -> &'static str {
        match self {
            Self::Instance(_) => "instance",
            Self::Static(_) => "static",
            Self::ClassBound(_) => "class",
        }
    }
}

impl<T> fmt::Debug for Callable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callable").field(&self.binding()).finish()
    }
}

/// How a parameter accepts its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// A required positional argument.
    Positional,
    /// Collects any remaining positional arguments.
    Variadic,
    /// Collects keyword arguments.
    Keywords,
    /// A positional argument with a default value.
    Defaulted,
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    name: String,
    kind: ParamKind,
}

impl ParamSpec {
    /// Creates a parameter specification.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Returns the parameter name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns how the parameter accepts its argument.
    #[must_use]
    pub const fn kind(&self) -> ParamKind {
        self.kind
    }
}

/// An invocable member.
pub struct Operation<T> {
    callable: Callable<T>,
    params: Vec<ParamSpec>,
    doc: Option<String>,
    metadata: MetadataTable,
}

impl<T> Operation<T> {
    /// Creates an operation from an instance method.
    #[must_use]
    pub fn method<F>(handler: F) -> Self
    where
        F: Fn(&T, Vec<Value>) -> Result<Value, BeanError> + Send + Sync + 'static,
    {
        Self::from_callable(Callable::Instance(Arc::new(handler)))
    }

    /// Creates an operation from a free function.
    #[must_use]
    pub fn function<F>(handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, BeanError> + Send + Sync + 'static,
    {
        Self::from_callable(Callable::Static(Arc::new(handler)))
    }

    /// Creates an operation from a function bound to the type.
    #[must_use]
    pub fn class_method<F>(handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, BeanError> + Send + Sync + 'static,
    {
        Self::from_callable(Callable::ClassBound(Arc::new(handler)))
    }

    fn from_callable(callable: Callable<T>) -> Self {
        Self {
            callable,
            params: Vec::new(),
            doc: None,
            metadata: MetadataTable::new(),
        }
    }

    /// Appends a positional parameter.
    #[must_use]
    pub fn param(self, name: impl Into<String>) -> Self {
        self.with_param(ParamSpec::new(name, ParamKind::Positional))
    }

    /// Appends a parameter collecting remaining positional arguments.
    #[must_use]
    pub fn variadic(self, name: impl Into<String>) -> Self {
        self.with_param(ParamSpec::new(name, ParamKind::Variadic))
    }

    /// Appends a parameter collecting keyword arguments.
    #[must_use]
    pub fn keywords(self, name: impl Into<String>) -> Self {
        self.with_param(ParamSpec::new(name, ParamKind::Keywords))
    }

    /// Appends a positional parameter with a default value.
    #[must_use]
    pub fn defaulted(self, name: impl Into<String>) -> Self {
        self.with_param(ParamSpec::new(name, ParamKind::Defaulted))
    }

    /// Appends a parameter specification.
    #[must_use]
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Sets the documentation.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Attaches a metadata tag.
    #[must_use]
    pub fn tagged(self, tag: Tag) -> Self {
        tag.apply(self)
    }

    /// Declares the return type.
    #[must_use]
    pub fn returns(self, value_type: impl Into<ValueType>) -> Self {
        self.tagged(metadata::returns(value_type))
    }

    /// Declares the parameter types in parameter order.
    #[must_use]
    pub fn params<I, D>(self, declarations: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Declaration>,
    {
        self.tagged(metadata::params(declarations))
    }

    /// Returns how the operation is bound.
    #[must_use]
    pub const fn callable(&self) -> &Callable<T> {
        &self.callable
    }

    /// Returns the declared parameters.
    #[must_use]
    pub fn parameters(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Returns the documentation, if any.
    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("callable", &self.callable)
            .field("params", &self.params)
            .field("doc", &self.doc)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl<T> Tagged for Operation<T> {
    fn metadata(&self) -> &MetadataTable {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut MetadataTable {
        &mut self.metadata
    }
}

/// One declared member of a bean.
pub enum Member<T> {
    /// An attribute published as a string.
    Property(Property<T>),
    /// An attribute with an explicit type.
    TypedProperty(TypedProperty<T>),
    /// An invocable member.
    Operation(Operation<T>),
    /// A notification channel owned by each instance.
    Signal(SignalAccessor<T>),
}

impl<T> Member<T> {
    /// Returns the property and its type override, for attribute members.
    #[must_use]
    pub const fn as_property(&self) -> Option<(&Property<T>, Option<&ValueType>)> {
        match self {
            Self::Property(property) => Some((property, None)),
            Self::TypedProperty(typed) => Some((typed.property(), Some(typed.value_type()))),
            Self::Operation(_) | Self::Signal(_) => None,
        }
    }

    /// Returns the operation, for operation members.
    #[must_use]
    pub const fn as_operation(&self) -> Option<&Operation<T>> {
        match self {
            Self::Operation(operation) => Some(operation),
            Self::Property(_) | Self::TypedProperty(_) | Self::Signal(_) => None,
        }
    }

    /// Returns the signal accessor, for channel members.
    #[must_use]
    pub const fn as_signal(&self) -> Option<&SignalAccessor<T>> {
        match self {
            Self::Signal(accessor) => Some(accessor),
            Self::Property(_) | Self::TypedProperty(_) | Self::Operation(_) => None,
        }
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(property) => f.debug_tuple("Property").field(property).finish(),
            Self::TypedProperty(typed) => f.debug_tuple("TypedProperty").field(typed).finish(),
            Self::Operation(operation) => f.debug_tuple("Operation").field(operation).finish(),
            Self::Signal(_) => f.write_str("Signal"),
        }
    }
}

/// Declared surface of a bean type.
///
/// Members keep their declaration order. Declaring a member under a name
/// already in use replaces the earlier declaration. Members whose name starts
/// with `_` are private and never exposed.
pub struct BeanShape<T> {
    class_name: String,
    doc: Option<String>,
    members: Vec<(String, Member<T>)>,
}

impl<T: 'static> BeanShape<T> {
    /// Creates an empty shape named after `T`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            class_name: std::any::type_name::<T>().replace("::", "."),
            doc: None,
            members: Vec::new(),
        }
    }
}

impl<T: 'static> Default for BeanShape<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BeanShape<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanShape")
            .field("class_name", &self.class_name)
            .field("doc", &self.doc)
            .field("members", &self.members)
            .finish()
    }
}

impl<T> BeanShape<T> {
    /// Overrides the qualified class name.
    #[must_use]
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Sets the class documentation.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Declares a member.
    #[must_use]
    pub fn member(mut self, name: impl Into<String>, member: Member<T>) -> Self {
        let key = name.into();
        match self.members.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = member,
            None => self.members.push((key, member)),
        }
        self
    }

    /// Declares a string attribute.
    #[must_use]
    pub fn property(self, name: impl Into<String>, property: Property<T>) -> Self {
        self.member(name, Member::Property(property))
    }

    /// Declares an attribute of an explicit type.
    #[must_use]
    pub fn typed_property(
        self,
        name: impl Into<String>,
        value_type: impl Into<ValueType>,
        property: Property<T>,
    ) -> Self {
        self.member(
            name,
            Member::TypedProperty(TypedProperty::new(value_type, property)),
        )
    }

    /// Declares an operation.
    #[must_use]
    pub fn operation(self, name: impl Into<String>, operation: Operation<T>) -> Self {
        self.member(name, Member::Operation(operation))
    }

    /// Declares a notification channel reached through `accessor`.
    #[must_use]
    pub fn signal<F>(self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> &Signal + Send + Sync + 'static,
    {
        self.member(name, Member::Signal(Arc::new(accessor)))
    }

    /// Returns the qualified class name.
    #[must_use]
    pub const fn class_name(&self) -> &str {
        self.class_name.as_str()
    }

    /// Returns the last segment of the class name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.class_name
            .rsplit('.')
            .next()
            .unwrap_or(self.class_name.as_str())
    }

    /// Returns the class documentation, if any.
    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Iterates over all members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Member<T>)> {
        self.members
            .iter()
            .map(|(name, member)| (name.as_str(), member))
    }

    /// Iterates over members whose name does not start with `_`.
    pub fn public_members(&self) -> impl Iterator<Item = (&str, &Member<T>)> {
        self.members().filter(|(name, _)| !name.starts_with('_'))
    }

    /// Looks up a public member by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Member<T>> {
        self.public_members()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, member)| member)
    }

    /// Returns the number of declared members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` when no members are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Error raised when an operation receives the wrong number of arguments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} argument(s), got {actual}")]
pub struct ArityError {
    /// Number of parameters the operation takes.
    pub expected: usize,
    /// Number of arguments supplied.
    pub actual: usize,
}

/// Destructures positional arguments into a fixed-size array.
///
/// # Errors
///
/// Returns an [`ArityError`] when the number of arguments differs from `N`.
pub fn arguments<const N: usize>(args: Vec<Value>) -> Result<[Value; N], BeanError> {
    let actual = args.len();
    <[Value; N]>::try_from(args).map_err(|_| {
        Box::new(ArityError {
            expected: N,
            actual,
        }) as BeanError
    })
}
