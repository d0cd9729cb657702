//! Protocol values and the coercions applied at the bean boundary.
//!
//! Beans produce loosely typed [`Value`]s. Before a value leaves the adapter
//! it is coerced into the [`ValueType`] declared for the attribute or
//! operation, so the host registry always sees values that match the
//! published description.

mod array;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::array::{ArrayType, ArrayValue};

/// Namespace shared by all scalar protocol types.
pub const LANG_NAMESPACE: &str = "mxbridge.lang";

/// Scalar types understood by the management protocol.
///
/// # Example
///
/// ```
/// use mxbridge::value::ScalarType;
///
/// assert_eq!(ScalarType::Integer.qualified_name(), "mxbridge.lang.Integer");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    /// Text; the default attribute type.
    String,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    Long,
    /// Boolean flag.
    Boolean,
    /// Double precision floating point number.
    Double,
    /// Marker for operations that return nothing.
    Void,
}

impl ScalarType {
    /// Returns the display name of the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::Boolean => "Boolean",
            Self::Double => "Double",
            Self::Void => "Void",
        }
    }

    /// Returns the namespace the type lives in.
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        LANG_NAMESPACE
    }

    /// Returns `namespace.name`.
    #[must_use]
    pub fn qualified_name(self) -> String {
        format!("{}.{}", self.namespace(), self.name())
    }

    /// Coerces a raw value into this type.
    ///
    /// `Null` passes through unchanged and `Void` discards any value.
    ///
    /// # Errors
    ///
    /// Returns a [`CoercionError`] when the value cannot represent this type.
    pub fn coerce(self, input: Value) -> Result<Value, CoercionError> {
        match (self, input) {
            (_, Value::Null) | (Self::Void, _) => Ok(Value::Null),
            (_, value @ Value::Array(_)) => Err(CoercionError::mismatch(self.name(), &value)),
            (Self::String, value) => Ok(Value::String(value.to_string())),
            (Self::Integer, value) => coerce_integer(value),
            (Self::Long, value) => coerce_long(value),
            (Self::Double, value) => coerce_double(value),
            (Self::Boolean, value) => coerce_boolean(value),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn coerce_integer(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Integer(number) => Ok(Value::Integer(number)),
        Value::Long(number) => i32::try_from(number)
            .map(Value::Integer)
            .map_err(|_| CoercionError::out_of_range(ScalarType::Integer.name(), number)),
        Value::String(text) => text
            .trim()
            .parse::<i32>()
            .map(Value::Integer)
            .map_err(|error| CoercionError::unparsable(ScalarType::Integer.name(), &text, &error)),
        other => Err(CoercionError::mismatch(ScalarType::Integer.name(), &other)),
    }
}

fn coerce_long(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Integer(number) => Ok(Value::Long(i64::from(number))),
        Value::Long(number) => Ok(Value::Long(number)),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::Long)
            .map_err(|error| CoercionError::unparsable(ScalarType::Long.name(), &text, &error)),
        other => Err(CoercionError::mismatch(ScalarType::Long.name(), &other)),
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "protocol doubles accept longs with the usual float rounding"
)]
fn coerce_double(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Integer(number) => Ok(Value::Double(f64::from(number))),
        Value::Long(number) => Ok(Value::Double(number as f64)),
        Value::Double(number) => Ok(Value::Double(number)),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|error| CoercionError::unparsable(ScalarType::Double.name(), &text, &error)),
        other => Err(CoercionError::mismatch(ScalarType::Double.name(), &other)),
    }
}

fn coerce_boolean(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Boolean(flag) => Ok(Value::Boolean(flag)),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(CoercionError::Unparsable {
                target: ScalarType::Boolean.name().to_owned(),
                input: text,
                message: String::from("expected 'true' or 'false'"),
            }),
        },
        other => Err(CoercionError::mismatch(ScalarType::Boolean.name(), &other)),
    }
}

/// Declared type of an attribute, parameter, or return value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// A scalar protocol type.
    Scalar(ScalarType),
    /// A homogeneous array of another type.
    Array(ArrayType),
}

impl ValueType {
    /// Text.
    pub const STRING: Self = Self::Scalar(ScalarType::String);
    /// 32-bit signed integer.
    pub const INTEGER: Self = Self::Scalar(ScalarType::Integer);
    /// 64-bit signed integer.
    pub const LONG: Self = Self::Scalar(ScalarType::Long);
    /// Boolean flag.
    pub const BOOLEAN: Self = Self::Scalar(ScalarType::Boolean);
    /// Double precision floating point number.
    pub const DOUBLE: Self = Self::Scalar(ScalarType::Double);
    /// Marker for operations that return nothing.
    pub const VOID: Self = Self::Scalar(ScalarType::Void);

    /// Type assumed for attributes that declare no explicit type.
    pub const DEFAULT_ATTRIBUTE: Self = Self::STRING;
    /// Type assumed for operations that declare no return type.
    pub const DEFAULT_RETURN: Self = Self::VOID;

    /// Creates an array type over `element`.
    #[must_use]
    pub fn array_of(element: impl Into<Self>) -> Self {
        Self::Array(ArrayType::new(element))
    }

    /// Returns the display name of the type.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Scalar(scalar) => scalar.name().to_owned(),
            Self::Array(array) => array.name(),
        }
    }

    /// Returns the namespace the type lives in.
    #[must_use]
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Scalar(scalar) => scalar.namespace(),
            Self::Array(array) => array.namespace(),
        }
    }

    /// Returns `namespace.name`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace(), self.name())
    }

    /// Returns `true` for the void marker.
    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Scalar(ScalarType::Void))
    }

    /// Coerces a raw value into this type.
    ///
    /// # Errors
    ///
    /// Returns a [`CoercionError`] when the value cannot represent this type.
    pub fn coerce(&self, value: Value) -> Result<Value, CoercionError> {
        match self {
            Self::Scalar(scalar) => scalar.coerce(value),
            Self::Array(array) => array.coerce(value),
        }
    }
}

impl From<ScalarType> for ValueType {
    fn from(scalar: ScalarType) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<ArrayType> for ValueType {
    fn from(array: ArrayType) -> Self {
        Self::Array(array)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// A value crossing the bean boundary.
///
/// # Example
///
/// ```
/// use mxbridge::value::{Value, ValueType};
///
/// let coerced = ValueType::STRING.coerce(Value::from(42)).unwrap();
/// assert_eq!(coerced, Value::from("42"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Text.
    String(String),
    /// 32-bit signed integer.
    Integer(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// Boolean flag.
    Boolean(bool),
    /// Double precision floating point number.
    Double(f64),
    /// Sequence of values.
    Array(ArrayValue),
}

impl Value {
    /// Returns a short name for the kind of value held.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Long(_) => "long",
            Self::Boolean(_) => "boolean",
            Self::Double(_) => "double",
            Self::Array(_) => "array",
        }
    }

    /// Returns `false` for null, empty text, zero, `false`, and empty arrays.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::String(text) => !text.is_empty(),
            Self::Integer(number) => *number != 0,
            Self::Long(number) => *number != 0,
            Self::Boolean(flag) => *flag,
            Self::Double(number) => *number != 0.0,
            Self::Array(array) => !array.is_empty(),
        }
    }

    /// Returns the text held by a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Returns the number held by an integer or long value.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(number) => Some(*number as i64),
            Self::Long(number) => Some(*number),
            _ => None,
        }
    }

    /// Returns the flag held by a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the array held by an array value.
    #[must_use]
    pub const fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::String(text) => f.write_str(text),
            Self::Integer(number) => write!(f, "{number}"),
            Self::Long(number) => write!(f, "{number}"),
            Self::Boolean(flag) => write!(f, "{flag}"),
            Self::Double(number) => write!(f, "{number}"),
            Self::Array(array) => write!(f, "{array}"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::String(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::String(text)
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Self::Integer(number)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Self::Long(number)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Boolean(flag)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::Double(number)
    }
}

impl From<ArrayValue> for Value {
    fn from(array: ArrayValue) -> Self {
        Self::Array(array)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(ArrayValue::untyped(items.into_iter().map(Into::into)))
    }
}

/// Failures converting a raw value into a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// The value kind cannot represent the target type.
    #[error("cannot coerce {found} value to {target}")]
    Mismatch {
        /// Display name of the target type.
        target: String,
        /// Kind of the rejected value.
        found: &'static str,
    },

    /// The number does not fit the target type.
    #[error("value {value} is out of range for {target}")]
    OutOfRange {
        /// Display name of the target type.
        target: String,
        /// Rendered value.
        value: String,
    },

    /// The text does not parse as the target type.
    #[error("cannot parse '{input}' as {target}: {message}")]
    Unparsable {
        /// Display name of the target type.
        target: String,
        /// Rejected input.
        input: String,
        /// Parser diagnostic.
        message: String,
    },
}

impl CoercionError {
    /// Creates a kind mismatch error.
    pub fn mismatch(target: impl Into<String>, found: &Value) -> Self {
        Self::Mismatch {
            target: target.into(),
            found: found.kind_name(),
        }
    }

    /// Creates an out-of-range error.
    pub fn out_of_range(target: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::OutOfRange {
            target: target.into(),
            value: value.to_string(),
        }
    }

    /// Creates a parse failure error.
    pub fn unparsable(
        target: impl Into<String>,
        input: &str,
        error: &impl fmt::Display,
    ) -> Self {
        Self::Unparsable {
            target: target.into(),
            input: input.to_owned(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests;
