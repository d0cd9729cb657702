//! Notification channels and their delivery.
//!
//! A [`Signal`] is a named channel owned by one bean instance. It starts
//! unwired, in which state emitting is a silent no-op. Compiling the bean's
//! description wires it exactly once with a sink, a sequence number supplier,
//! and a source identifier; from then on every emission produces a
//! [`Notification`] carrying a fresh sequence number.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, mpsc};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::trace;

use crate::error::AdapterError;
use crate::value::Value;

/// Tracing target for notification delivery.
pub(crate) const SIGNAL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::signal");

/// Qualified name of the notification payload class.
pub const NOTIFICATION_CLASS: &str = concat!(env!("CARGO_PKG_NAME"), ".Notification");

/// Receives every notification emitted through a wired signal.
pub type NotificationSink = Arc<dyn Fn(Notification) + Send + Sync>;

/// Draws the next notification sequence number.
pub type SequenceSupplier = Arc<dyn Fn() -> u64 + Send + Sync>;

/// A notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    kind: String,
    source: String,
    sequence: u64,
    timestamp: OffsetDateTime,
    message: Option<String>,
    user_data: Option<String>,
}

impl Notification {
    /// Creates a notification without message or user data.
    #[must_use]
    pub fn new(kind: impl Into<String>, source: impl Into<String>, sequence: u64) -> Self {
        Self {
            kind: kind.into(),
            source: source.into(),
            sequence,
            timestamp: OffsetDateTime::now_utc(),
            message: None,
            user_data: None,
        }
    }

    /// Attaches a message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches opaque user data.
    #[must_use]
    pub fn with_user_data(mut self, user_data: impl Into<String>) -> Self {
        self.user_data = Some(user_data.into());
        self
    }

    /// Returns the name of the channel that emitted the notification.
    #[must_use]
    pub const fn kind(&self) -> &str {
        self.kind.as_str()
    }

    /// Returns the identifier of the emitting bean.
    #[must_use]
    pub const fn source(&self) -> &str {
        self.source.as_str()
    }

    /// Returns the sequence number.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the emission time.
    #[must_use]
    pub const fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// Returns the message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the user data, if any.
    #[must_use]
    pub fn user_data(&self) -> Option<&str> {
        self.user_data.as_deref()
    }
}

/// Describes the notifications a bean can emit.
///
/// All channels of one bean share a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationInfo {
    types: Vec<String>,
    notification_class: String,
    description: String,
}

impl NotificationInfo {
    /// Creates a record covering the given channel names.
    #[must_use]
    pub fn new(types: Vec<String>, description: impl Into<String>) -> Self {
        Self {
            types,
            notification_class: NOTIFICATION_CLASS.to_owned(),
            description: description.into(),
        }
    }

    /// Returns the channel names.
    #[must_use]
    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// Returns the qualified payload class name.
    #[must_use]
    pub const fn notification_class(&self) -> &str {
        self.notification_class.as_str()
    }

    /// Returns the human-readable category.
    #[must_use]
    pub const fn description(&self) -> &str {
        self.description.as_str()
    }
}

/// A named notification channel owned by a bean instance.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// use mxbridge::signal::{Notification, Signal};
///
/// let signal = Signal::new("test");
/// assert_eq!(signal.emit("ignored"), None);
///
/// let counter = Arc::new(AtomicU64::new(0));
/// signal.set_sink(Arc::new(|_: Notification| {})).unwrap();
/// signal
///     .set_sequence(Arc::new(move || counter.fetch_add(1, Ordering::SeqCst) + 1))
///     .unwrap();
/// signal.set_source("Demo").unwrap();
///
/// assert_eq!(signal.emit("hello"), Some(1));
/// ```
pub struct Signal {
    name: String,
    sink: OnceLock<NotificationSink>,
    next_sequence: OnceLock<SequenceSupplier>,
    source: OnceLock<String>,
}

impl Signal {
    /// Creates an unwired channel.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sink: OnceLock::new(),
            next_sequence: OnceLock::new(),
            source: OnceLock::new(),
        }
    }

    /// Returns the channel name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Sets the function receiving emitted notifications.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::StateConflict`] if a sink is already set.
    pub fn set_sink(&self, sink: NotificationSink) -> Result<(), AdapterError> {
        self.sink
            .set(sink)
            .map_err(|_| self.wiring_conflict("notification sink"))
    }

    /// Sets the sequence number supplier.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::StateConflict`] if a supplier is already set.
    pub fn set_sequence(&self, supplier: SequenceSupplier) -> Result<(), AdapterError> {
        self.next_sequence
            .set(supplier)
            .map_err(|_| self.wiring_conflict("sequence supplier"))
    }

    /// Sets the source identifier stamped on notifications.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::StateConflict`] if a source is already set.
    pub fn set_source(&self, source: impl Into<String>) -> Result<(), AdapterError> {
        self.source
            .set(source.into())
            .map_err(|_| self.wiring_conflict("source"))
    }

    /// Returns `true` once all three wiring slots are filled.
    #[must_use]
    pub fn is_wired(&self) -> bool {
        self.sink.get().is_some() && self.next_sequence.get().is_some() && self.source.get().is_some()
    }

    /// Emits a notification carrying `message`.
    ///
    /// Returns the sequence number drawn, or `None` while unwired.
    pub fn emit(&self, message: impl Into<Value>) -> Option<u64> {
        self.emit_with(message, Value::Null)
    }

    /// Emits a notification carrying `message` and `user_data`.
    ///
    /// Both are rendered as text and attached only when truthy.
    pub fn emit_with(&self, message: impl Into<Value>, user_data: impl Into<Value>) -> Option<u64> {
        let (Some(sink), Some(next_sequence), Some(source)) = (
            self.sink.get(),
            self.next_sequence.get(),
            self.source.get(),
        ) else {
            trace!(target: SIGNAL_TARGET, signal = %self.name, "signal not wired; dropping");
            return None;
        };

        let text = message.into();
        let data = user_data.into();
        let sequence = next_sequence();
        let mut notification = Notification::new(self.name.as_str(), source.as_str(), sequence);
        if text.is_truthy() {
            notification = notification.with_message(text.to_string());
        }
        if data.is_truthy() {
            notification = notification.with_user_data(data.to_string());
        }
        sink(notification);
        Some(sequence)
    }

    fn wiring_conflict(&self, slot: &str) -> AdapterError {
        AdapterError::state_conflict(format!(
            "cannot set {slot} of signal '{}' twice",
            self.name
        ))
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("source", &self.source.get())
            .field("wired", &self.is_wired())
            .finish_non_exhaustive()
    }
}

/// Fans notifications out to subscribers.
///
/// Subscribers whose receiver has been dropped are removed on the next
/// delivery.
#[derive(Debug, Default)]
pub struct Broadcaster {
    subscribers: Mutex<Vec<mpsc::Sender<Notification>>>,
}

impl Broadcaster {
    /// Creates a broadcaster without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> mpsc::Receiver<Notification> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    /// Delivers a notification to every live subscriber.
    pub fn send(&self, notification: &Notification) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|subscriber| subscriber.send(notification.clone()).is_ok());
        trace!(
            target: SIGNAL_TARGET,
            kind = notification.kind(),
            sequence = notification.sequence(),
            subscribers = subscribers.len(),
            "delivered notification"
        );
    }

    /// Returns the number of subscribers seen at the last delivery.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
