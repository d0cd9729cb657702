//! Registration identifiers of the form `domain:key=value[,key=value...]`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Name under which a bean is registered with a host registry.
///
/// Properties keep the order in which they were written, and the name
/// renders back exactly as parsed.
///
/// # Example
///
/// ```
/// use mxbridge::object_name::ObjectName;
///
/// let name = ObjectName::parse("mxbridge:name=demo,type=Demo").unwrap();
/// assert_eq!(name.domain(), "mxbridge");
/// assert_eq!(name.property("type"), Some("Demo"));
/// assert_eq!(name.to_string(), "mxbridge:name=demo,type=Demo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectName {
    domain: String,
    properties: Vec<(String, String)>,
}

impl ObjectName {
    /// Parses a textual name.
    ///
    /// # Errors
    ///
    /// Returns an [`ObjectNameError`] describing the first defect found.
    pub fn parse(input: &str) -> Result<Self, ObjectNameError> {
        let (domain, rest) = input
            .split_once(':')
            .ok_or_else(|| ObjectNameError::MissingDomain {
                input: input.to_owned(),
            })?;
        if domain.is_empty() {
            return Err(ObjectNameError::EmptyDomain);
        }
        if domain.contains([',', '=']) {
            return Err(ObjectNameError::InvalidDomain {
                domain: domain.to_owned(),
            });
        }
        if rest.is_empty() {
            return Err(ObjectNameError::NoProperties);
        }

        let mut properties: Vec<(String, String)> = Vec::new();
        for property in rest.split(',') {
            let (key, value) = parse_property(property)?;
            if properties.iter().any(|(existing, _)| existing == key) {
                return Err(ObjectNameError::DuplicateKey {
                    key: key.to_owned(),
                });
            }
            properties.push((key.to_owned(), value.to_owned()));
        }

        Ok(Self {
            domain: domain.to_owned(),
            properties,
        })
    }

    /// Returns the domain.
    #[must_use]
    pub const fn domain(&self) -> &str {
        self.domain.as_str()
    }

    /// Returns the value of the property named `key`.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over the properties in written order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

fn parse_property(property: &str) -> Result<(&str, &str), ObjectNameError> {
    let malformed = || ObjectNameError::MalformedProperty {
        property: property.to_owned(),
    };
    let (key, value) = property.split_once('=').ok_or_else(malformed)?;
    if key.is_empty() {
        return Err(ObjectNameError::EmptyKey {
            property: property.to_owned(),
        });
    }
    if value.is_empty() || value.contains(['=', ':']) || key.contains(':') {
        return Err(malformed());
    }
    Ok((key, value))
}

impl FromStr for ObjectName {
    type Err = ObjectNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for ObjectName {
    type Error = ObjectNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.domain)?;
        for (index, (key, value)) in self.properties.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Defects in a textual registration name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectNameError {
    /// The name has no `:` separating domain and properties.
    #[error("object name '{input}' has no domain separator")]
    MissingDomain {
        /// Rejected input.
        input: String,
    },

    /// The domain is empty.
    #[error("object name domain is empty")]
    EmptyDomain,

    /// The domain contains a property delimiter.
    #[error("object name domain '{domain}' contains ',' or '='")]
    InvalidDomain {
        /// Rejected domain.
        domain: String,
    },

    /// No `key=value` property follows the domain.
    #[error("object name has no properties")]
    NoProperties,

    /// A property is not of the form `key=value`.
    #[error("malformed object name property '{property}'")]
    MalformedProperty {
        /// Rejected property text.
        property: String,
    },

    /// A property has an empty key.
    #[error("object name property '{property}' has an empty key")]
    EmptyKey {
        /// Rejected property text.
        property: String,
    },

    /// A key appears more than once.
    #[error("object name property key '{key}' appears more than once")]
    DuplicateKey {
        /// Repeated key.
        key: String,
    },
}
