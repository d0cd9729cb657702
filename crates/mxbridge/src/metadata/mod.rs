//! Labelled metadata attached to callables.
//!
//! A [`Tagger`] turns declaration arguments into a [`Tag`], optionally
//! reshaping them with a modifier first, and a tag stores its declaration
//! under a label in the callable's [`MetadataTable`]. The compiler reads two
//! labels: the declared return type ([`DECLARE_RETURN`]) and the declared
//! parameter types ([`DECLARE_PARAMS`]).
//!
//! # Example
//!
//! ```
//! use mxbridge::metadata::{Declaration, MetadataTable, Tagged, params, returns};
//! use mxbridge::value::ValueType;
//!
//! #[derive(Default)]
//! struct Callable(MetadataTable);
//!
//! impl Tagged for Callable {
//!     fn metadata(&self) -> &MetadataTable { &self.0 }
//!     fn metadata_mut(&mut self) -> &mut MetadataTable { &mut self.0 }
//! }
//!
//! let callable = returns(ValueType::STRING).apply(Callable::default());
//! let callable = params([(ValueType::STRING, "User name")]).apply(callable);
//!
//! assert_eq!(
//!     callable.metadata().get("returns"),
//!     Some(&Declaration::Type(ValueType::STRING)),
//! );
//! ```

use std::collections::BTreeMap;

use crate::value::{ArrayType, ScalarType, ValueType};

/// Label under which the declared return type is stored.
pub const RETURNS_LABEL: &str = "returns";

/// Label under which the declared parameter types are stored.
pub const PARAMS_LABEL: &str = "params";

/// Declaration argument stored as metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// A bare type.
    Type(ValueType),
    /// A type with a human-readable description.
    Described(ValueType, String),
    /// An ordered group of declarations.
    Sequence(Vec<Declaration>),
}

impl Declaration {
    /// Returns the declared type of a single declaration.
    #[must_use]
    pub const fn value_type(&self) -> Option<&ValueType> {
        match self {
            Self::Type(value_type) | Self::Described(value_type, _) => Some(value_type),
            Self::Sequence(_) => None,
        }
    }

    /// Returns the description of a described declaration.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Described(_, description) => Some(description.as_str()),
            Self::Type(_) | Self::Sequence(_) => None,
        }
    }

    /// Returns the entries of a sequence declaration.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Self]> {
        match self {
            Self::Sequence(entries) => Some(entries),
            Self::Type(_) | Self::Described(..) => None,
        }
    }
}

impl From<ValueType> for Declaration {
    fn from(value_type: ValueType) -> Self {
        Self::Type(value_type)
    }
}

impl From<ScalarType> for Declaration {
    fn from(scalar: ScalarType) -> Self {
        Self::Type(scalar.into())
    }
}

impl From<ArrayType> for Declaration {
    fn from(array: ArrayType) -> Self {
        Self::Type(array.into())
    }
}

impl<T: Into<ValueType>> From<(T, &str)> for Declaration {
    fn from((value_type, description): (T, &str)) -> Self {
        Self::Described(value_type.into(), description.to_owned())
    }
}

impl<T: Into<ValueType>> From<(T, String)> for Declaration {
    fn from((value_type, description): (T, String)) -> Self {
        Self::Described(value_type.into(), description)
    }
}

/// Declarations stored on a callable, keyed by label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataTable {
    entries: BTreeMap<&'static str, Declaration>,
}

impl MetadataTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a declaration, replacing any previous one under the label.
    pub fn insert(&mut self, label: &'static str, declaration: Declaration) {
        self.entries.insert(label, declaration);
    }

    /// Looks up the declaration stored under `label`.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&Declaration> {
        self.entries.get(label)
    }

    /// Returns `true` when a declaration is stored under `label`.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    /// Returns the number of stored declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Anything that carries a [`MetadataTable`].
pub trait Tagged {
    /// Returns the stored metadata.
    fn metadata(&self) -> &MetadataTable;

    /// Returns the stored metadata for modification.
    fn metadata_mut(&mut self) -> &mut MetadataTable;
}

/// Reshapes declaration arguments before they are stored.
pub type Modifier = fn(Vec<Declaration>) -> Declaration;

/// Factory producing tags for one label.
#[derive(Debug, Clone, Copy)]
pub struct Tagger {
    label: &'static str,
    modifier: Option<Modifier>,
}

impl Tagger {
    /// Creates a tagger storing under `label`.
    ///
    /// Without a modifier the arguments are stored as a
    /// [`Declaration::Sequence`] in the order given.
    #[must_use]
    pub const fn new(label: &'static str, modifier: Option<Modifier>) -> Self {
        Self { label, modifier }
    }

    /// Returns the label the tagger stores under.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Builds a tag from declaration arguments.
    pub fn declare<I, D>(&self, args: I) -> Tag
    where
        I: IntoIterator<Item = D>,
        D: Into<Declaration>,
    {
        let args: Vec<Declaration> = args.into_iter().map(Into::into).collect();
        let value = match self.modifier {
            Some(modifier) => modifier(args),
            None => Declaration::Sequence(args),
        };
        Tag {
            label: self.label,
            value,
        }
    }
}

/// A declaration ready to be attached to a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    label: &'static str,
    value: Declaration,
}

impl Tag {
    /// Returns the label the tag stores under.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Returns the stored declaration.
    #[must_use]
    pub const fn value(&self) -> &Declaration {
        &self.value
    }

    /// Stores the declaration on `callable` and hands it back.
    pub fn apply<C: Tagged>(self, mut callable: C) -> C {
        callable.metadata_mut().insert(self.label, self.value);
        callable
    }
}

fn keep_single(args: Vec<Declaration>) -> Declaration {
    args.into_iter()
        .next()
        .unwrap_or_else(|| Declaration::Sequence(Vec::new()))
}

fn collect_sequence(args: Vec<Declaration>) -> Declaration {
    Declaration::Sequence(args)
}

/// Declares the return type of an operation.
pub const DECLARE_RETURN: Tagger = Tagger::new(RETURNS_LABEL, Some(keep_single));

/// Declares the parameter types of an operation, in parameter order.
pub const DECLARE_PARAMS: Tagger = Tagger::new(PARAMS_LABEL, Some(collect_sequence));

/// Builds a return type tag.
pub fn returns(value_type: impl Into<ValueType>) -> Tag {
    DECLARE_RETURN.declare([Declaration::Type(value_type.into())])
}

/// Builds a parameter types tag.
///
/// Each entry is either a bare type or a `(type, description)` pair.
pub fn params<I, D>(declarations: I) -> Tag
where
    I: IntoIterator<Item = D>,
    D: Into<Declaration>,
{
    DECLARE_PARAMS.declare(declarations)
}
