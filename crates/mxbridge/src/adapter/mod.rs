//! Dynamic dispatch of protocol calls onto a bean instance.
//!
//! [`BeanAdapter`] owns a bean, its [`BeanShape`], and the memoized
//! [`CompiledDescription`]. It implements the [`DynamicBean`] protocol
//! surface through which a host registry reads and writes attributes,
//! invokes operations, and subscribes to notifications.
//!
//! One mutex per adapter guards the registration state, the memoized
//! description, and the notification sequence counter. Attribute access and
//! operation calls run outside that lock; the bean is responsible for its
//! own interior synchronization. Notifications must never be emitted while
//! the adapter lock is held, because drawing a sequence number takes it.
//! The server is likewise called with the lock released, since it may read
//! the bean while registering or unregistering it.
//!
//! A compilation failure is not memoized: every later call compiles again
//! and reports the same failure until the shape is fixed.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::compiler::{self, CompiledDescription, Wiring};
use crate::error::{AdapterError, MemberKind};
use crate::object_name::ObjectName;
use crate::server::ManagementServer;
use crate::shape::{ArityError, BeanShape, Callable, ManagedBean, Member};
use crate::signal::{Broadcaster, Notification, NotificationInfo};
use crate::value::{CoercionError, Value, ValueType};

/// Tracing target for adapter events.
pub const ADAPTER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::adapter");

/// A named attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    value: Value,
}

impl Attribute {
    /// Pairs `name` with `value`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the attribute name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the attribute value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Splits the attribute into name and value.
    #[must_use]
    pub fn into_parts(self) -> (String, Value) {
        (self.name, self.value)
    }
}

/// Ordered attribute values.
pub type AttributeList = Vec<Attribute>;

/// Protocol surface a host registry drives.
pub trait DynamicBean: Send + Sync {
    /// Returns the structural description of the bean.
    ///
    /// # Errors
    ///
    /// Returns the compilation failure, if any.
    fn describe(&self) -> Result<Arc<CompiledDescription>, AdapterError>;

    /// Reads an attribute, coerced to its declared type.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NotFound`] for unknown or unreadable
    /// attributes and [`AdapterError::Dispatch`] when the getter or the
    /// coercion fails.
    fn get_attribute(&self, name: &str) -> Result<Value, AdapterError>;

    /// Reads several attributes, omitting names the bean does not declare.
    ///
    /// # Errors
    ///
    /// Returns the first failure other than an unknown name.
    fn get_attributes(&self, names: &[&str]) -> Result<AttributeList, AdapterError>;

    /// Writes an attribute without coercion.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NotFound`] for unknown attributes,
    /// [`AdapterError::ReadOnly`] when no setter exists, and
    /// [`AdapterError::Dispatch`] when the setter fails.
    fn set_attribute(&self, attribute: Attribute) -> Result<(), AdapterError>;

    /// Writes attributes in order, stopping at the first failure.
    ///
    /// Writes that succeeded before the failure are kept.
    ///
    /// # Errors
    ///
    /// Returns the first failing write.
    fn set_attributes(&self, attributes: AttributeList) -> Result<(), AdapterError>;

    /// Invokes an operation with positional arguments.
    ///
    /// Returns `None` for operations declared to return nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NotFound`] for unknown operations and
    /// [`AdapterError::Dispatch`] when the call or the coercion of its
    /// result fails.
    fn invoke(
        &self,
        name: &str,
        args: Vec<Value>,
        signature: &[&str],
    ) -> Result<Option<Value>, AdapterError>;

    /// Describes the notifications the bean can emit.
    ///
    /// # Errors
    ///
    /// Returns the compilation failure, if any.
    fn notification_info(&self) -> Result<NotificationInfo, AdapterError>;

    /// Subscribes to every notification the bean emits from now on.
    fn subscribe(&self) -> mpsc::Receiver<Notification>;
}

/// Where the adapter stands with its server.
///
/// The host is called without the adapter lock held, so a registration
/// change passes through a transitional state that rejects concurrent
/// changes while letting the host read the bean.
#[derive(Debug, Default)]
enum Registration {
    #[default]
    Unregistered,
    Registering(ObjectName),
    Registered(ObjectName),
    Unregistering(ObjectName),
}

impl Registration {
    const fn name(&self) -> Option<&ObjectName> {
        match self {
            Self::Registered(name) => Some(name),
            Self::Unregistered | Self::Registering(_) | Self::Unregistering(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct AdapterState {
    registration: Registration,
    description: Option<Arc<CompiledDescription>>,
    last_sequence: u64,
}

/// Exposes a bean through the [`DynamicBean`] protocol.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use mxbridge::adapter::{BeanAdapter, DynamicBean};
/// use mxbridge::server::InMemoryServer;
/// use mxbridge::shape::{BeanShape, ManagedBean, Property};
///
/// struct Answer;
///
/// impl ManagedBean for Answer {
///     fn shape() -> BeanShape<Self> {
///         BeanShape::new().property("value", Property::new().with_getter(|_: &Self| 42))
///     }
/// }
///
/// let server = Arc::new(InMemoryServer::new());
/// let adapter = BeanAdapter::new(Arc::new(Answer), server.clone());
/// adapter.register("demo:name=answer").unwrap();
/// assert_eq!(adapter.get_attribute("value").unwrap().to_string(), "42");
/// adapter.unregister().unwrap();
/// ```
pub struct BeanAdapter<T> {
    bean: Arc<T>,
    shape: BeanShape<T>,
    server: Arc<dyn ManagementServer>,
    state: Arc<Mutex<AdapterState>>,
    broadcaster: Arc<Broadcaster>,
}

impl<T: ManagedBean> BeanAdapter<T> {
    /// Wraps `bean` using the shape its type declares.
    #[must_use]
    pub fn new(bean: Arc<T>, server: Arc<dyn ManagementServer>) -> Arc<Self> {
        Self::with_shape(bean, T::shape(), server)
    }
}

impl<T: Send + Sync + 'static> BeanAdapter<T> {
    /// Wraps `bean` using an explicit shape.
    #[must_use]
    pub fn with_shape(
        bean: Arc<T>,
        shape: BeanShape<T>,
        server: Arc<dyn ManagementServer>,
    ) -> Arc<Self> {
        Arc::new(Self {
            bean,
            shape,
            server,
            state: Arc::new(Mutex::new(AdapterState::default())),
            broadcaster: Arc::new(Broadcaster::new()),
        })
    }

    /// Returns the wrapped bean.
    #[must_use]
    pub const fn bean(&self) -> &Arc<T> {
        &self.bean
    }

    /// Returns the declared shape.
    #[must_use]
    pub const fn shape(&self) -> &BeanShape<T> {
        &self.shape
    }

    /// Binds the adapter into its server under `name`.
    ///
    /// The description is compiled first, wiring the bean's signals. The
    /// server is called without the adapter lock held, so it may read the
    /// bean while registering it.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidName`] for unparsable names,
    /// [`AdapterError::StateConflict`] when already registered or while
    /// another registration change is in progress, the compilation
    /// failure, or the server's rejection.
    pub fn register(self: &Arc<Self>, name: &str) -> Result<(), AdapterError> {
        self.logged("register", || {
            let object_name = ObjectName::parse(name)?;
            {
                let mut state = self.lock_state()?;
                match &state.registration {
                    Registration::Unregistered => {}
                    Registration::Registered(existing) => {
                        return Err(AdapterError::state_conflict(format!(
                            "adapter already registered as '{existing}'"
                        )));
                    }
                    Registration::Registering(pending) | Registration::Unregistering(pending) => {
                        return Err(transition_in_progress(pending));
                    }
                }
                self.described(&mut state)?;
                state.registration = Registration::Registering(object_name.clone());
            }

            debug!(target: ADAPTER_TARGET, name = %object_name, "registering adapter");
            let handle: Arc<dyn DynamicBean> = Arc::clone(self) as Arc<dyn DynamicBean>;
            let outcome = self.server.register_bean(object_name.clone(), handle);
            self.settle(if outcome.is_ok() {
                Registration::Registered(object_name)
            } else {
                Registration::Unregistered
            });
            outcome.map_err(AdapterError::from)
        })
    }

    /// Removes the adapter from its server.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::StateConflict`] when not registered or while
    /// another registration change is in progress, or the server's
    /// rejection.
    pub fn unregister(&self) -> Result<(), AdapterError> {
        self.logged("unregister", || {
            let object_name = {
                let mut state = self.lock_state()?;
                let current = match &state.registration {
                    Registration::Registered(registered) => registered.clone(),
                    Registration::Unregistered => {
                        return Err(AdapterError::state_conflict("adapter not registered"));
                    }
                    Registration::Registering(pending) | Registration::Unregistering(pending) => {
                        return Err(transition_in_progress(pending));
                    }
                };
                state.registration = Registration::Unregistering(current.clone());
                current
            };

            debug!(target: ADAPTER_TARGET, name = %object_name, "unregistering adapter");
            let outcome = self.server.unregister_bean(&object_name);
            self.settle(if outcome.is_ok() {
                Registration::Unregistered
            } else {
                Registration::Registered(object_name)
            });
            outcome.map_err(AdapterError::from)
        })
    }

    /// Returns `true` while the adapter is bound into its server.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registration_name().is_some()
    }

    /// Returns the name the adapter is registered under.
    ///
    /// `None` while a registration change is still in flight.
    #[must_use]
    pub fn registration_name(&self) -> Option<ObjectName> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .registration
            .name()
            .cloned()
    }

    /// Emits a notification through the channel named `channel`.
    ///
    /// Returns the sequence number drawn for the notification.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::StateConflict`] before registration and
    /// [`AdapterError::NotFound`] for unknown channels.
    pub fn send_notification(
        &self,
        channel: &str,
        message: impl Into<Value>,
        user_data: impl Into<Value>,
    ) -> Result<u64, AdapterError> {
        self.logged("send_notification", || {
            if !self.is_registered() {
                return Err(AdapterError::state_conflict(
                    "cannot send notifications before registration",
                ));
            }
            let accessor = self
                .shape
                .find(channel)
                .and_then(Member::as_signal)
                .ok_or_else(|| AdapterError::not_found(MemberKind::Notification, channel))?;
            debug!(target: ADAPTER_TARGET, channel, "emitting notification");
            accessor(self.bean.as_ref())
                .emit_with(message, user_data)
                .ok_or_else(|| {
                    AdapterError::state_conflict(format!("signal '{channel}' is not wired"))
                })
        })
    }

    fn logged<R>(
        &self,
        operation: &'static str,
        body: impl FnOnce() -> Result<R, AdapterError>,
    ) -> Result<R, AdapterError> {
        body().inspect_err(|err| {
            error!(
                target: ADAPTER_TARGET,
                operation,
                class = self.shape.class_name(),
                error = %err,
                "adapter operation failed"
            );
        })
    }

    /// Records the outcome of a registration change. The server has already
    /// acted, so a poisoned lock must not lose the outcome.
    fn settle(&self, registration: Registration) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .registration = registration;
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, AdapterState>, AdapterError> {
        self.state
            .lock()
            .map_err(|_| AdapterError::internal("adapter state lock poisoned"))
    }

    fn description(&self) -> Result<Arc<CompiledDescription>, AdapterError> {
        let mut state = self.lock_state()?;
        self.described(&mut state)
    }

    fn described(&self, state: &mut AdapterState) -> Result<Arc<CompiledDescription>, AdapterError> {
        if let Some(description) = &state.description {
            return Ok(Arc::clone(description));
        }
        debug!(target: ADAPTER_TARGET, class = self.shape.class_name(), "inspecting bean");
        let description = Arc::new(compiler::compile(
            &self.shape,
            self.bean.as_ref(),
            &self.wiring(),
        )?);
        state.description = Some(Arc::clone(&description));
        Ok(description)
    }

    fn wiring(&self) -> Wiring {
        let state = Arc::clone(&self.state);
        let broadcaster = Arc::clone(&self.broadcaster);
        Wiring {
            sink: Arc::new(move |notification: Notification| broadcaster.send(&notification)),
            sequence: Arc::new(move || next_sequence(&state)),
        }
    }

    fn read_attribute(&self, name: &str) -> Result<Value, AdapterError> {
        let description = self.description()?;
        let not_found = || AdapterError::not_found(MemberKind::Attribute, name);
        let descriptor = description.attribute(name).ok_or_else(not_found)?;
        let getter = self
            .shape
            .find(name)
            .and_then(Member::as_property)
            .and_then(|(property, _)| property.getter())
            .ok_or_else(not_found)?;
        let raw = getter(self.bean.as_ref()).map_err(|err| AdapterError::dispatch(name, err))?;
        descriptor
            .value_type
            .coerce(raw)
            .map_err(|err| AdapterError::coercion(name, err))
    }

    fn write_attribute(&self, attribute: Attribute) -> Result<(), AdapterError> {
        let (name, value) = attribute.into_parts();
        debug!(target: ADAPTER_TARGET, attribute = %name, %value, "attribute set");
        let description = self.description()?;
        if description.attribute(&name).is_none() {
            return Err(AdapterError::not_found(MemberKind::Attribute, name));
        }
        let Some(setter) = self
            .shape
            .find(&name)
            .and_then(Member::as_property)
            .and_then(|(property, _)| property.setter())
        else {
            return Err(AdapterError::read_only(name));
        };
        setter(self.bean.as_ref(), value).map_err(|err| AdapterError::dispatch(name, err))
    }

    fn call_operation(
        &self,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Option<Value>, AdapterError> {
        let description = self.description()?;
        let not_found = || AdapterError::not_found(MemberKind::Operation, name);
        let descriptor = description.operation(name).ok_or_else(not_found)?;
        let operation = self
            .shape
            .find(name)
            .and_then(Member::as_operation)
            .ok_or_else(not_found)?;
        let Callable::Instance(handler) = operation.callable() else {
            return Err(AdapterError::internal(format!(
                "operation '{name}' is not bound to the instance"
            )));
        };

        let expected = descriptor.parameters.len();
        if args.len() != expected {
            let arity = ArityError {
                expected,
                actual: args.len(),
            };
            return Err(AdapterError::dispatch(name, Box::new(arity)));
        }

        let raw = handler(self.bean.as_ref(), args).map_err(|err| AdapterError::dispatch(name, err))?;
        coerce_result(&descriptor.return_type, raw).map_err(|err| AdapterError::coercion(name, err))
    }
}

fn coerce_result(
    return_type: &ValueType,
    raw: Value,
) -> Result<Option<Value>, CoercionError> {
    if return_type.is_void() {
        return Ok(None);
    }
    return_type.coerce(raw).map(Some)
}

fn transition_in_progress(name: &ObjectName) -> AdapterError {
    AdapterError::state_conflict(format!(
        "registration change for '{name}' already in progress"
    ))
}

fn next_sequence(state: &Mutex<AdapterState>) -> u64 {
    let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
    guard.last_sequence = guard.last_sequence.saturating_add(1);
    guard.last_sequence
}

impl<T: Send + Sync + 'static> DynamicBean for BeanAdapter<T> {
    fn describe(&self) -> Result<Arc<CompiledDescription>, AdapterError> {
        self.logged("describe", || {
            debug!(target: ADAPTER_TARGET, "description requested");
            self.description()
        })
    }

    fn get_attribute(&self, name: &str) -> Result<Value, AdapterError> {
        self.logged("get_attribute", || {
            debug!(target: ADAPTER_TARGET, attribute = name, "attribute requested");
            self.read_attribute(name)
        })
    }

    fn get_attributes(&self, names: &[&str]) -> Result<AttributeList, AdapterError> {
        self.logged("get_attributes", || {
            debug!(target: ADAPTER_TARGET, ?names, "attributes requested");
            let mut attributes = AttributeList::with_capacity(names.len());
            for &name in names {
                match self.read_attribute(name) {
                    Ok(value) => attributes.push(Attribute::new(name, value)),
                    Err(err) if err.is_not_found() => {
                        debug!(target: ADAPTER_TARGET, attribute = name, "skipping unknown attribute");
                    }
                    Err(err) => return Err(err),
                }
            }
            Ok(attributes)
        })
    }

    fn set_attribute(&self, attribute: Attribute) -> Result<(), AdapterError> {
        self.logged("set_attribute", || self.write_attribute(attribute))
    }

    fn set_attributes(&self, attributes: AttributeList) -> Result<(), AdapterError> {
        self.logged("set_attributes", || {
            attributes
                .into_iter()
                .try_for_each(|attribute| self.write_attribute(attribute))
        })
    }

    fn invoke(
        &self,
        name: &str,
        args: Vec<Value>,
        signature: &[&str],
    ) -> Result<Option<Value>, AdapterError> {
        self.logged("invoke", || {
            debug!(
                target: ADAPTER_TARGET,
                operation = name,
                args = args.len(),
                ?signature,
                "invoke"
            );
            self.call_operation(name, args)
        })
    }

    fn notification_info(&self) -> Result<NotificationInfo, AdapterError> {
        self.logged("notification_info", || {
            debug!(target: ADAPTER_TARGET, "notification info requested");
            Ok(self.description()?.notification_info.clone())
        })
    }

    fn subscribe(&self) -> mpsc::Receiver<Notification> {
        self.broadcaster.subscribe()
    }
}

impl<T> fmt::Debug for BeanAdapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanAdapter")
            .field("shape", &self.shape)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
