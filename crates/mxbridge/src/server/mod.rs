//! Host registry interface and an in-memory registry.
//!
//! An adapter binds itself into a [`ManagementServer`] under an
//! [`ObjectName`]. The [`InMemoryServer`] keeps registered beans in a sorted
//! map and routes protocol calls to them by name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, mpsc};

use thiserror::Error;
use tracing::debug;

use crate::adapter::{Attribute, AttributeList, DynamicBean};
use crate::compiler::CompiledDescription;
use crate::error::AdapterError;
use crate::object_name::ObjectName;
use crate::signal::{Notification, NotificationInfo};
use crate::value::Value;

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Failures reported by a host registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A bean is already registered under the name.
    #[error("a bean is already registered as '{name}'")]
    AlreadyRegistered {
        /// Rejected name.
        name: String,
    },

    /// No bean is registered under the name.
    #[error("no bean is registered as '{name}'")]
    NotRegistered {
        /// Unknown name.
        name: String,
    },

    /// The registry lock was poisoned by a panicking thread.
    #[error("registry lock poisoned")]
    Poisoned,
}

/// A registry that adapters bind themselves into.
pub trait ManagementServer: Send + Sync {
    /// Binds `bean` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] if the name is taken.
    fn register_bean(&self, name: ObjectName, bean: Arc<dyn DynamicBean>)
    -> Result<(), RegistryError>;

    /// Removes the bean bound under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] if nothing is bound there.
    fn unregister_bean(&self, name: &ObjectName) -> Result<(), RegistryError>;
}

/// Registry holding beans in process memory.
///
/// Lookups clone the bean handle and release the registry lock before
/// calling into the bean, so a bean may register or unregister itself while
/// serving a routed call.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use mxbridge::server::InMemoryServer;
///
/// let server = Arc::new(InMemoryServer::new());
/// assert!(server.is_empty());
/// ```
#[derive(Default)]
pub struct InMemoryServer {
    beans: RwLock<BTreeMap<ObjectName, Arc<dyn DynamicBean>>>,
}

impl InMemoryServer {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the registered names in sorted order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if the registry lock is poisoned.
    pub fn names(&self) -> Result<Vec<ObjectName>, RegistryError> {
        let beans = self.beans.read().map_err(|_| RegistryError::Poisoned)?;
        Ok(beans.keys().cloned().collect())
    }

    /// Returns `true` if a bean is bound under `name`.
    #[must_use]
    pub fn contains(&self, name: &ObjectName) -> bool {
        self.beans
            .read()
            .is_ok_and(|beans| beans.contains_key(name))
    }

    /// Returns the number of registered beans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.beans.read().map_or(0, |beans| beans.len())
    }

    /// Returns `true` when no bean is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bean bound under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] for unknown names.
    pub fn lookup(&self, name: &ObjectName) -> Result<Arc<dyn DynamicBean>, RegistryError> {
        let beans = self.beans.read().map_err(|_| RegistryError::Poisoned)?;
        beans
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotRegistered {
                name: name.to_string(),
            })
    }

    /// Routes a describe call.
    ///
    /// # Errors
    ///
    /// Returns the registry or bean failure.
    pub fn describe(&self, name: &ObjectName) -> Result<Arc<CompiledDescription>, AdapterError> {
        self.lookup(name)?.describe()
    }

    /// Routes an attribute read.
    ///
    /// # Errors
    ///
    /// Returns the registry or bean failure.
    pub fn get_attribute(&self, name: &ObjectName, attribute: &str) -> Result<Value, AdapterError> {
        self.lookup(name)?.get_attribute(attribute)
    }

    /// Routes a batch attribute read.
    ///
    /// # Errors
    ///
    /// Returns the registry or bean failure.
    pub fn get_attributes(
        &self,
        name: &ObjectName,
        attributes: &[&str],
    ) -> Result<AttributeList, AdapterError> {
        self.lookup(name)?.get_attributes(attributes)
    }

    /// Routes an attribute write.
    ///
    /// # Errors
    ///
    /// Returns the registry or bean failure.
    pub fn set_attribute(&self, name: &ObjectName, attribute: Attribute) -> Result<(), AdapterError> {
        self.lookup(name)?.set_attribute(attribute)
    }

    /// Routes a batch attribute write.
    ///
    /// # Errors
    ///
    /// Returns the registry or bean failure.
    pub fn set_attributes(
        &self,
        name: &ObjectName,
        attributes: AttributeList,
    ) -> Result<(), AdapterError> {
        self.lookup(name)?.set_attributes(attributes)
    }

    /// Routes an operation invocation.
    ///
    /// # Errors
    ///
    /// Returns the registry or bean failure.
    pub fn invoke(
        &self,
        name: &ObjectName,
        operation: &str,
        args: Vec<Value>,
        signature: &[&str],
    ) -> Result<Option<Value>, AdapterError> {
        self.lookup(name)?.invoke(operation, args, signature)
    }

    /// Routes a notification info request.
    ///
    /// # Errors
    ///
    /// Returns the registry or bean failure.
    pub fn notification_info(&self, name: &ObjectName) -> Result<NotificationInfo, AdapterError> {
        self.lookup(name)?.notification_info()
    }

    /// Subscribes to the notifications of the bean bound under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] for unknown names.
    pub fn subscribe(
        &self,
        name: &ObjectName,
    ) -> Result<mpsc::Receiver<Notification>, RegistryError> {
        Ok(self.lookup(name)?.subscribe())
    }
}

impl ManagementServer for InMemoryServer {
    fn register_bean(
        &self,
        name: ObjectName,
        bean: Arc<dyn DynamicBean>,
    ) -> Result<(), RegistryError> {
        let mut beans = self.beans.write().map_err(|_| RegistryError::Poisoned)?;
        if beans.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered {
                name: name.to_string(),
            });
        }
        debug!(target: SERVER_TARGET, name = %name, "registered bean");
        beans.insert(name, bean);
        Ok(())
    }

    fn unregister_bean(&self, name: &ObjectName) -> Result<(), RegistryError> {
        let mut beans = self.beans.write().map_err(|_| RegistryError::Poisoned)?;
        if beans.remove(name).is_none() {
            return Err(RegistryError::NotRegistered {
                name: name.to_string(),
            });
        }
        debug!(target: SERVER_TARGET, name = %name, "unregistered bean");
        Ok(())
    }
}

impl fmt::Debug for InMemoryServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names().unwrap_or_default();
        f.debug_struct("InMemoryServer")
            .field("names", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests;
