//! Domain errors raised while compiling and dispatching bean requests.
//!
//! Every failure surfaced to the host registry is an [`AdapterError`]. The
//! variants map onto the four protocol error kinds: validation failures of a
//! bean declaration, lookups of unknown members, illegal state transitions,
//! and failures raised by bean code while a request is dispatched. Failures
//! raised by bean code keep the original error as their `source`.

use std::error::Error as StdError;

use thiserror::Error;

use crate::object_name::ObjectNameError;
use crate::server::RegistryError;
use crate::value::CoercionError;

/// Error type returned by getters, setters and operations of a bean.
pub type BeanError = Box<dyn StdError + Send + Sync>;

/// Category of member that a lookup targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A readable or writable attribute.
    Attribute,
    /// An invocable operation.
    Operation,
    /// A notification channel.
    Notification,
}

impl MemberKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attribute => "attribute",
            Self::Operation => "operation",
            Self::Notification => "notification",
        }
    }
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the adapter to its host registry.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The bean declaration is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The requested member does not exist on the bean.
    #[error("no such {kind}: {name}")]
    NotFound {
        /// Category of member that was looked up.
        kind: MemberKind,
        /// Name that was looked up.
        name: String,
    },

    /// An operation was attempted in a state that forbids it.
    #[error("state conflict: {message}")]
    StateConflict {
        /// Description of the conflicting transition.
        message: String,
    },

    /// Bean code or value coercion failed while serving a request.
    #[error("dispatch of '{member}' failed: {source}")]
    Dispatch {
        /// Member being read, written, or invoked.
        member: String,
        /// Original failure.
        #[source]
        source: BeanError,
    },

    /// The attribute exists but has no setter.
    #[error("attribute '{name}' is read-only")]
    ReadOnly {
        /// Attribute name.
        name: String,
    },

    /// The host registry rejected a registration change.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The registration name could not be parsed.
    #[error(transparent)]
    InvalidName(#[from] ObjectNameError),

    /// Internal error (e.g. a poisoned lock).
    #[error("internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl AdapterError {
    /// Creates a not-found error.
    pub fn not_found(kind: MemberKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Creates a state conflict error.
    pub fn state_conflict(message: impl Into<String>) -> Self {
        Self::StateConflict {
            message: message.into(),
        }
    }

    /// Wraps a failure raised by bean code.
    pub fn dispatch(member: impl Into<String>, source: BeanError) -> Self {
        Self::Dispatch {
            member: member.into(),
            source,
        }
    }

    /// Wraps a coercion failure for the given member.
    pub fn coercion(member: impl Into<String>, source: CoercionError) -> Self {
        Self::dispatch(member, Box::new(source))
    }

    /// Creates a read-only attribute error.
    pub fn read_only(name: impl Into<String>) -> Self {
        Self::ReadOnly { name: name.into() }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` for lookups of members the bean does not declare.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Structural defects found while compiling a bean declaration.
///
/// Compilation stops at the first defect; no partial description is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The operation is a free function rather than an instance method.
    #[error("operation '{member}' is not an instance method")]
    NotInstanceMethod {
        /// Member name.
        member: String,
    },

    /// The operation is bound to the type rather than to an instance.
    #[error("operation '{member}' is bound to the class")]
    ClassBound {
        /// Member name.
        member: String,
    },

    /// The operation declares variadic, keyword, or defaulted parameters.
    #[error("operation '{member}' declares variadic, keyword, or defaulted parameters")]
    UnsupportedParameters {
        /// Member name.
        member: String,
    },

    /// The operation takes parameters but declares no parameter types.
    #[error("operation '{member}' takes parameters but declares no parameter types")]
    MissingParameterTypes {
        /// Member name.
        member: String,
    },

    /// The number of declared parameter types differs from the arity.
    #[error(
        "operation '{member}' declares {declared} parameter type(s) for {expected} parameter(s)"
    )]
    ParameterCountMismatch {
        /// Member name.
        member: String,
        /// Number of declared parameter types.
        declared: usize,
        /// Number of parameters the operation takes.
        expected: usize,
    },

    /// A type declaration does not have the expected structure.
    #[error("operation '{member}' has a malformed {label} declaration")]
    MalformedDeclaration {
        /// Member name.
        member: String,
        /// Label of the offending declaration.
        label: &'static str,
    },

    /// Two notification channels resolve to the same signal instance.
    #[error("channels '{member}' and '{other}' share one signal")]
    SharedSignal {
        /// Channel declared later.
        member: String,
        /// Channel declared earlier on the same signal.
        other: String,
    },
}
