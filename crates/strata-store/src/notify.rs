//! Change notification
//!
//! Listeners run synchronously on the writing thread, after the write has
//! been applied and the cache invalidated, in subscription order.

use crate::error::{AttrError, AttrResult, ListenerError};
use crate::level::Level;
use std::fmt;
use strata_value::{AttrPath, Value};

/// A successful write
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Level written
    pub level: Level,
    /// Location written, from the level root
    pub path: AttrPath,
    /// Value stored (for appends, the appended item)
    pub value: Value,
}

impl ChangeEvent {
    /// Create new event
    #[inline]
    #[must_use]
    pub fn new(level: Level, path: AttrPath, value: Value) -> Self {
        Self { level, path, value }
    }
}

/// Receiver of change events
///
/// Implemented for any `FnMut(&ChangeEvent) -> Result<(), ListenerError>`.
pub trait ChangeListener: Send {
    /// Handle one event; an error is returned to the writer
    ///
    /// # Errors
    /// Any error the listener wants the writer to see
    fn on_change(&mut self, event: &ChangeEvent) -> Result<(), ListenerError>;
}

impl<F> ChangeListener for F
where
    F: FnMut(&ChangeEvent) -> Result<(), ListenerError> + Send,
{
    fn on_change(&mut self, event: &ChangeEvent) -> Result<(), ListenerError> {
        self(event)
    }
}

/// Handle for removing a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Ordered set of listeners
#[derive(Default)]
pub struct Notifier {
    listeners: Vec<(ListenerId, Box<dyn ChangeListener>)>,
    next_id: u64,
}

impl Notifier {
    /// Create notifier without listeners
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe(&mut self, listener: impl ChangeListener + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; `false` if it was not registered
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Number of registered listeners
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver an event to every listener in order
    ///
    /// # Errors
    /// The first listener failure; later listeners do not see the event
    pub fn notify(&mut self, event: &ChangeEvent) -> AttrResult<()> {
        for (_, listener) in &mut self.listeners {
            listener.on_change(event).map_err(AttrError::listener)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
