//! Array types and values.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{CoercionError, Value, ValueType};

/// Type-level wrapper describing "array of `T`".
///
/// The wrapper reports the element's namespace and the element's name with
/// an `[]` suffix, and coerces sequences element by element.
///
/// # Example
///
/// ```
/// use mxbridge::value::{ArrayType, Value, ValueType};
///
/// let strings = ArrayType::new(ValueType::STRING);
/// assert_eq!(strings.name(), "String[]");
///
/// let coerced = strings.coerce(Value::from(vec![1, 2])).unwrap();
/// assert_eq!(coerced.to_string(), "[1, 2]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArrayType {
    element: Box<ValueType>,
}

impl ArrayType {
    /// Creates an array type over `element`.
    #[must_use]
    pub fn new(element: impl Into<ValueType>) -> Self {
        Self {
            element: Box::new(element.into()),
        }
    }

    /// Returns the element type.
    #[must_use]
    pub fn element(&self) -> &ValueType {
        &self.element
    }

    /// Returns the element name followed by `[]`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}[]", self.element.name())
    }

    /// Returns the element's namespace.
    #[must_use]
    pub fn namespace(&self) -> &'static str {
        self.element.namespace()
    }

    /// Coerces every element of a sequence through the element type.
    ///
    /// # Errors
    ///
    /// Returns a [`CoercionError`] if the value is not a sequence or any
    /// element fails to coerce.
    pub fn coerce(&self, value: Value) -> Result<Value, CoercionError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Array(array) => {
                let items = array
                    .items
                    .into_vec()
                    .into_iter()
                    .map(|item| self.element.coerce(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(ArrayValue {
                    element_type: Some((*self.element).clone()),
                    items: items.into_boxed_slice(),
                }))
            }
            other => Err(CoercionError::mismatch(self.name(), &other)),
        }
    }
}

/// A fixed-size sequence of values.
///
/// Arrays built by beans are untyped; arrays produced by coercion carry the
/// element type they were coerced into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    element_type: Option<ValueType>,
    items: Box<[Value]>,
}

impl ArrayValue {
    /// Creates an untyped array from raw values.
    pub fn untyped(items: impl IntoIterator<Item = Value>) -> Self {
        Self {
            element_type: None,
            items: items.into_iter().collect(),
        }
    }

    /// Returns the element type, if the array was produced by coercion.
    #[must_use]
    pub const fn element_type(&self) -> Option<&ValueType> {
        self.element_type.as_ref()
    }

    /// Returns the elements.
    #[must_use]
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, item) in self.items.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str("]")
    }
}
