//! # LogWriter - lifecycle events through `tracing`
//!
//! Renders every [`Event`] as one `tracing` record under the `servekit` target.
//! Failures are logged at `error`, lifecycle transitions at `info`, per-component
//! progress at `debug`.

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber backed by `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let component = e.component.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::AppStarting => {
                tracing::info!(target: "servekit", seq = e.seq, "app starting");
            }
            EventKind::AppRunning => {
                tracing::info!(target: "servekit", seq = e.seq, components = reason, "app running");
            }
            EventKind::SignalReceived => {
                let signal = e.signal.map(|s| s.as_str()).unwrap_or("unknown");
                tracing::info!(target: "servekit", seq = e.seq, signal, "termination signal received");
            }
            EventKind::StopRequested => {
                tracing::info!(target: "servekit", seq = e.seq, "stop requested");
            }
            EventKind::AppStopped => match &e.reason {
                Some(err) => tracing::error!(target: "servekit", seq = e.seq, error = %err, "app stopped with error"),
                None => tracing::info!(target: "servekit", seq = e.seq, "app stopped"),
            },
            EventKind::ComponentStarting => {
                tracing::debug!(target: "servekit", seq = e.seq, component, "component starting");
            }
            EventKind::ComponentExited => {
                tracing::debug!(target: "servekit", seq = e.seq, component, "component exited");
            }
            EventKind::ComponentStopping => {
                tracing::debug!(target: "servekit", seq = e.seq, component, "component stopping");
            }
            EventKind::ComponentStopped => {
                tracing::debug!(target: "servekit", seq = e.seq, component, "component stopped");
            }
            EventKind::ComponentStartFailed => {
                tracing::error!(target: "servekit", seq = e.seq, component, error = reason, "component failed to start");
            }
            EventKind::ComponentStopFailed => {
                tracing::error!(target: "servekit", seq = e.seq, component, error = reason, "component failed to stop");
            }
            EventKind::ComponentPanicked => {
                tracing::error!(target: "servekit", seq = e.seq, component, panic = reason, "component panicked");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "servekit", subscriber = component, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "servekit", subscriber = component, panic = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
