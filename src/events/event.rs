//! # Lifecycle events emitted by the app runtime.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata
//! (component name, reason, signal, timestamps).
//!
//! ## Ordering guarantees
//! Each event gets a globally unique, monotonically increasing `seq`.
//! Subscribers may see events late, but `seq` restores the publication order.
//!
//! ## Example
//! ```rust
//! use servekit::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ComponentStartFailed)
//!     .with_component("http")
//!     .with_reason("bind: address in use");
//!
//! assert_eq!(ev.kind, EventKind::ComponentStartFailed);
//! assert_eq!(ev.component.as_deref(), Some("http"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::Signal;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === App events ===
    /// `run` was entered; components are about to be started.
    AppStarting,

    /// Every starter has been dispatched and the termination source is installed.
    ///
    /// Sets:
    /// - `reason`: number of components
    AppRunning,

    /// A termination event arrived from the termination source.
    ///
    /// Sets:
    /// - `signal`: the received signal
    SignalReceived,

    /// `stop()` fired the root cancellation (published once).
    StopRequested,

    /// All components stopped and `run` is about to return.
    ///
    /// Sets:
    /// - `reason`: error label, if `run` returns an error
    AppStopped,

    // === Component events ===
    /// Component `start` is about to be called.
    ComponentStarting,

    /// Component `start` returned `Ok` or was cancelled.
    ComponentExited,

    /// Component `start` returned an error.
    ///
    /// Sets:
    /// - `reason`: error message
    ComponentStartFailed,

    /// Cancellation observed; component `stop` is about to be called.
    ComponentStopping,

    /// Component `stop` returned `Ok` or was cancelled.
    ComponentStopped,

    /// Component `stop` returned an error.
    ///
    /// Sets:
    /// - `reason`: error message
    ComponentStopFailed,

    /// Component `start` or `stop` panicked.
    ///
    /// Sets:
    /// - `reason`: panic message
    ComponentPanicked,

    // === Subscriber events ===
    /// Subscriber panicked while processing an event.
    ///
    /// Sets:
    /// - `component`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `component`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Component (or subscriber) name, if applicable.
    pub component: Option<Arc<str>>,
    /// Human-readable reason (errors, panic info, overflow details).
    pub reason: Option<Arc<str>>,
    /// Received signal (only for `SignalReceived`).
    pub signal: Option<Signal>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            component: None,
            reason: None,
            signal: None,
        }
    }

    /// Attaches a component name.
    #[inline]
    pub fn with_component(mut self, component: impl Into<Arc<str>>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the received signal.
    #[inline]
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_component(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_component(subscriber)
            .with_reason(info)
    }

    /// True for events emitted by the subscriber workers themselves.
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }

    /// True for events emitted by component starters/stoppers.
    pub fn is_component_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ComponentStarting
                | EventKind::ComponentExited
                | EventKind::ComponentStartFailed
                | EventKind::ComponentStopping
                | EventKind::ComponentStopped
                | EventKind::ComponentStopFailed
                | EventKind::ComponentPanicked
        )
    }
}
