//! Compilation of a bean shape into its published description.
//!
//! [`compile`] walks the public members of a [`BeanShape`], classifies them
//! into attributes, operations and notification channels, validates every
//! operation signature, and finally wires the instance's signals. Any
//! validation failure aborts the whole compilation before a signal is
//! touched, so a corrected shape can be compiled against the same instance.
//!
//! The compiler does not memoize; the adapter keeps the first successful
//! result.

use serde::Serialize;
use tracing::debug;

use crate::error::{AdapterError, ValidationError};
use crate::metadata::{Declaration, PARAMS_LABEL, RETURNS_LABEL, Tagged};
use crate::shape::{BeanShape, Callable, Member, Operation, ParamKind, Property, SignalAccessor};
use crate::signal::{NotificationInfo, NotificationSink, SequenceSupplier, Signal};
use crate::value::ValueType;

const COMPILER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::compiler");

/// Category text published for every bean's notifications.
pub const NOTIFICATION_DESCRIPTION: &str =
    concat!("Notifications emitted through ", env!("CARGO_PKG_NAME"));

/// Published description of a readable and/or writable attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDescriptor {
    /// Attribute name.
    pub name: String,
    /// Declared value type.
    pub value_type: ValueType,
    /// Single-line documentation; empty when undocumented.
    pub description: String,
    /// Whether a getter is present.
    pub readable: bool,
    /// Whether a setter is present.
    pub writable: bool,
}

/// Effect an operation has on its bean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Impact {
    /// The operation may change the bean's state.
    Action,
}

/// Published description of one operation parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDescriptor {
    /// Parameter name.
    pub name: String,
    /// Declared value type.
    pub value_type: ValueType,
    /// Optional documentation.
    pub description: Option<String>,
}

/// Published description of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationDescriptor {
    /// Operation name.
    pub name: String,
    /// Single-line documentation; empty when undocumented.
    pub description: String,
    /// Parameters in call order.
    pub parameters: Vec<ParameterDescriptor>,
    /// Declared return type; [`ValueType::VOID`] when undeclared.
    pub return_type: ValueType,
    /// Effect on the bean; always [`Impact::Action`].
    pub impact: Impact,
}

/// Structural summary of a bean, built once per adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledDescription {
    /// Qualified class name of the bean type.
    pub class_name: String,
    /// Single-line class documentation.
    pub description: String,
    /// Attributes in declaration order.
    pub attributes: Vec<AttributeDescriptor>,
    /// Operations in declaration order.
    pub operations: Vec<OperationDescriptor>,
    /// Shared record for all notification channels.
    pub notification_info: NotificationInfo,
}

impl CompiledDescription {
    /// Returns the names of the notification channels.
    #[must_use]
    pub fn notification_channels(&self) -> &[String] {
        self.notification_info.types()
    }

    /// Looks up an attribute descriptor by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// Looks up an operation descriptor by name.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.iter().find(|operation| operation.name == name)
    }
}

/// Delivery functions handed to every signal of a compiled bean.
#[derive(Clone)]
pub struct Wiring {
    /// Receives emitted notifications.
    pub sink: NotificationSink,
    /// Draws sequence numbers shared by all channels of the bean.
    pub sequence: SequenceSupplier,
}

impl std::fmt::Debug for Wiring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wiring").finish_non_exhaustive()
    }
}

/// Flattens documentation text onto one line.
///
/// Each line is trimmed, blank lines are dropped, and the remaining lines
/// are joined with single spaces. Paragraph breaks therefore collapse to a
/// single space rather than leaving a doubled one.
///
/// ```
/// use mxbridge::compiler::flatten_doc;
///
/// assert_eq!(flatten_doc("\n    Abc\n    def\n    "), "Abc def");
/// ```
#[must_use]
pub fn flatten_doc(doc: &str) -> String {
    doc.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compiles `shape` against `bean` and wires the bean's signals.
///
/// # Errors
///
/// Returns [`AdapterError::Validation`] for a malformed operation or for two
/// channels sharing one signal, and [`AdapterError::StateConflict`] when a
/// signal of `bean` was already wired by an earlier compilation. Signals are
/// wired only once every check has passed.
pub fn compile<T>(
    shape: &BeanShape<T>,
    bean: &T,
    wiring: &Wiring,
) -> Result<CompiledDescription, AdapterError> {
    debug!(
        target: COMPILER_TARGET,
        class = shape.class_name(),
        members = shape.len(),
        "compiling bean description"
    );

    let mut attributes = Vec::new();
    let mut operations = Vec::new();
    let mut signals: Vec<(&str, &SignalAccessor<T>)> = Vec::new();

    for (name, member) in shape.public_members() {
        match member {
            Member::Property(property) => {
                attributes.push(describe_attribute(name, property, None));
            }
            Member::TypedProperty(typed) => {
                attributes.push(describe_attribute(
                    name,
                    typed.property(),
                    Some(typed.value_type()),
                ));
            }
            Member::Operation(operation) => {
                operations.push(describe_operation(name, operation)?);
            }
            Member::Signal(accessor) => signals.push((name, accessor)),
        }
    }

    let resolved = resolve_signals(signals, bean)?;
    let source = shape.simple_name();
    let mut channels = Vec::with_capacity(resolved.len());
    for (name, signal) in resolved {
        signal.set_sink(wiring.sink.clone())?;
        signal.set_sequence(wiring.sequence.clone())?;
        signal.set_source(source)?;
        channels.push(name.to_owned());
    }

    debug!(
        target: COMPILER_TARGET,
        class = shape.class_name(),
        attributes = attributes.len(),
        operations = operations.len(),
        channels = channels.len(),
        "compiled bean description"
    );

    Ok(CompiledDescription {
        class_name: shape.class_name().to_owned(),
        description: flatten_doc(shape.doc().unwrap_or_default()),
        attributes,
        operations,
        notification_info: NotificationInfo::new(channels, NOTIFICATION_DESCRIPTION),
    })
}

/// Reaches every channel's signal and checks that none is shared or already
/// wired, so that wiring either touches every signal or none.
fn resolve_signals<'a, T>(
    signals: Vec<(&'a str, &SignalAccessor<T>)>,
    bean: &'a T,
) -> Result<Vec<(&'a str, &'a Signal)>, AdapterError> {
    let mut resolved: Vec<(&str, &Signal)> = Vec::with_capacity(signals.len());
    for (name, accessor) in signals {
        let signal = accessor(bean);
        if let Some((other, _)) = resolved
            .iter()
            .find(|(_, seen)| std::ptr::eq(*seen, signal))
        {
            return Err(ValidationError::SharedSignal {
                member: name.to_owned(),
                other: (*other).to_owned(),
            }
            .into());
        }
        if signal.is_wired() {
            return Err(AdapterError::state_conflict(format!(
                "signal of channel '{name}' is already wired"
            )));
        }
        resolved.push((name, signal));
    }
    Ok(resolved)
}

fn describe_attribute<T>(
    name: &str,
    property: &Property<T>,
    value_type: Option<&ValueType>,
) -> AttributeDescriptor {
    AttributeDescriptor {
        name: name.to_owned(),
        value_type: value_type.cloned().unwrap_or(ValueType::DEFAULT_ATTRIBUTE),
        description: flatten_doc(property.doc().unwrap_or_default()),
        readable: property.getter().is_some(),
        writable: property.setter().is_some(),
    }
}

fn describe_operation<T>(
    name: &str,
    operation: &Operation<T>,
) -> Result<OperationDescriptor, ValidationError> {
    match operation.callable() {
        Callable::Instance(_) => {}
        Callable::Static(_) => {
            return Err(ValidationError::NotInstanceMethod {
                member: name.to_owned(),
            });
        }
        Callable::ClassBound(_) => {
            return Err(ValidationError::ClassBound {
                member: name.to_owned(),
            });
        }
    }

    let params = operation.parameters();
    if params
        .iter()
        .any(|param| param.kind() != ParamKind::Positional)
    {
        return Err(ValidationError::UnsupportedParameters {
            member: name.to_owned(),
        });
    }

    let parameters = match declared_parameter_types(name, operation)? {
        None if params.is_empty() => Vec::new(),
        None => {
            return Err(ValidationError::MissingParameterTypes {
                member: name.to_owned(),
            });
        }
        Some(types) if types.len() != params.len() => {
            return Err(ValidationError::ParameterCountMismatch {
                member: name.to_owned(),
                declared: types.len(),
                expected: params.len(),
            });
        }
        Some(types) => params
            .iter()
            .zip(types)
            .map(|(param, declaration)| describe_parameter(name, param.name(), declaration))
            .collect::<Result<_, _>>()?,
    };

    let return_type = match operation.metadata().get(RETURNS_LABEL) {
        None => ValueType::DEFAULT_RETURN,
        Some(declaration) => declaration
            .value_type()
            .cloned()
            .ok_or_else(|| malformed(name, RETURNS_LABEL))?,
    };

    Ok(OperationDescriptor {
        name: name.to_owned(),
        description: flatten_doc(operation.doc().unwrap_or_default()),
        parameters,
        return_type,
        impact: Impact::Action,
    })
}

fn declared_parameter_types<'a, T>(
    name: &str,
    operation: &'a Operation<T>,
) -> Result<Option<&'a [Declaration]>, ValidationError> {
    operation
        .metadata()
        .get(PARAMS_LABEL)
        .map(|declaration| {
            declaration
                .as_sequence()
                .ok_or_else(|| malformed(name, PARAMS_LABEL))
        })
        .transpose()
}

fn describe_parameter(
    member: &str,
    param: &str,
    declaration: &Declaration,
) -> Result<ParameterDescriptor, ValidationError> {
    let value_type = declaration
        .value_type()
        .cloned()
        .ok_or_else(|| malformed(member, PARAMS_LABEL))?;
    Ok(ParameterDescriptor {
        name: param.to_owned(),
        value_type,
        description: declaration.description().map(str::to_owned),
    })
}

fn malformed(member: &str, label: &'static str) -> ValidationError {
    ValidationError::MalformedDeclaration {
        member: member.to_owned(),
        label,
    }
}
