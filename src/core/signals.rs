//! # Termination sources.
//!
//! The app does not bind to OS signal APIs directly. It asks a [`Termination`] source for
//! a stream of [`Signal`]s once every component start has been dispatched, and treats each
//! item as a stop request.
//!
//! - [`OsSignals`]: process signals through `tokio::signal`.
//!   **Unix**: any of `SIGTERM`, `SIGQUIT`, `SIGINT`, `SIGHUP`, `SIGUSR1`, `SIGUSR2`
//!   (default set: terminate, quit, interrupt).
//!   **Other platforms**: Ctrl-C only, reported as [`Signal::Interrupt`].
//! - [`ChannelTermination`]: in-process source fed by a [`TerminationTrigger`]; events
//!   triggered before the app listens are buffered.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc;

use crate::error::RuntimeError;

/// Termination request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `SIGINT` / Ctrl-C.
    Interrupt,
    /// `SIGTERM`.
    Terminate,
    /// `SIGQUIT`.
    Quit,
    /// `SIGHUP`.
    Hangup,
    /// `SIGUSR1`.
    User1,
    /// `SIGUSR2`.
    User2,
}

impl Signal {
    /// Signals watched when nothing else is configured.
    pub const DEFAULT_SET: [Signal; 3] = [Signal::Terminate, Signal::Quit, Signal::Interrupt];

    /// Short stable name.
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Quit => "SIGQUIT",
            Signal::Hangup => "SIGHUP",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
        }
    }

    #[cfg(unix)]
    fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Quit => SignalKind::quit(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::User1 => SignalKind::user_defined1(),
            Signal::User2 => SignalKind::user_defined2(),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stream of termination requests; ends when the source can produce no more.
pub type SignalStream = BoxStream<'static, Signal>;

/// Producer of termination requests.
pub trait Termination: Send + Sync + 'static {
    /// Installs the source and returns its stream.
    ///
    /// Called once per app run, after every component start has been dispatched.
    fn listen(&self) -> Result<SignalStream, RuntimeError>;
}

/// Process signals as a termination source.
#[derive(Debug, Clone)]
pub struct OsSignals {
    signals: Vec<Signal>,
}

impl OsSignals {
    /// Watches the given signals.
    pub fn new(signals: impl IntoIterator<Item = Signal>) -> Self {
        let mut list: Vec<Signal> = Vec::new();
        for s in signals {
            if !list.contains(&s) {
                list.push(s);
            }
        }
        Self { signals: list }
    }

    /// Watched signals, without duplicates.
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }
}

impl Default for OsSignals {
    fn default() -> Self {
        Self::new(Signal::DEFAULT_SET)
    }
}

impl Termination for OsSignals {
    #[cfg(unix)]
    fn listen(&self) -> Result<SignalStream, RuntimeError> {
        use tokio::signal::unix::signal;

        let mut streams = Vec::with_capacity(self.signals.len());
        for &sig in &self.signals {
            let listener = signal(sig.kind()).map_err(|e| RuntimeError::SignalInstall {
                error: format!("{sig}: {e}"),
            })?;
            streams.push(
                stream::unfold(listener, move |mut l| async move {
                    l.recv().await.map(|()| (sig, l))
                })
                .boxed(),
            );
        }
        Ok(stream::select_all(streams).boxed())
    }

    #[cfg(not(unix))]
    fn listen(&self) -> Result<SignalStream, RuntimeError> {
        if self.signals.is_empty() {
            return Ok(stream::empty().boxed());
        }
        Ok(stream::unfold((), |()| async {
            tokio::signal::ctrl_c()
                .await
                .ok()
                .map(|()| (Signal::Interrupt, ()))
        })
        .boxed())
    }
}

/// Sending half of a [`ChannelTermination`].
#[derive(Debug, Clone)]
pub struct TerminationTrigger {
    tx: mpsc::UnboundedSender<Signal>,
}

impl TerminationTrigger {
    /// Requests termination; returns `false` if the source was dropped.
    pub fn trigger(&self, signal: Signal) -> bool {
        self.tx.send(signal).is_ok()
    }
}

/// In-process termination source, listened to at most once.
#[derive(Debug)]
pub struct ChannelTermination {
    rx: Mutex<Option<mpsc::UnboundedReceiver<Signal>>>,
}

impl ChannelTermination {
    /// Creates the trigger and the source.
    pub fn new() -> (TerminationTrigger, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            TerminationTrigger { tx },
            Self {
                rx: Mutex::new(Some(rx)),
            },
        )
    }
}

impl Termination for ChannelTermination {
    fn listen(&self) -> Result<SignalStream, RuntimeError> {
        let rx = self
            .rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| RuntimeError::SignalInstall {
                error: "channel termination already listening".to_string(),
            })?;
        Ok(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|sig| (sig, rx))
        })
        .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set() {
        let os = OsSignals::default();
        assert_eq!(
            os.signals(),
            &[Signal::Terminate, Signal::Quit, Signal::Interrupt]
        );
    }

    #[test]
    fn test_duplicates_are_removed() {
        let os = OsSignals::new([Signal::Hangup, Signal::Hangup, Signal::User1]);
        assert_eq!(os.signals(), &[Signal::Hangup, Signal::User1]);
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(Signal::Terminate.to_string(), "SIGTERM");
        assert_eq!(Signal::Interrupt.as_str(), "SIGINT");
    }

    #[tokio::test]
    async fn test_channel_buffers_until_listen() {
        let (trigger, source) = ChannelTermination::new();
        assert!(trigger.trigger(Signal::Quit));

        let mut stream = source.listen().unwrap();
        assert_eq!(stream.next().await, Some(Signal::Quit));

        assert!(trigger.trigger(Signal::Terminate));
        assert_eq!(stream.next().await, Some(Signal::Terminate));
    }

    #[tokio::test]
    async fn test_channel_listens_once() {
        let (_trigger, source) = ChannelTermination::new();
        let _stream = source.listen().unwrap();
        assert!(matches!(
            source.listen(),
            Err(RuntimeError::SignalInstall { .. })
        ));
    }

    #[tokio::test]
    async fn test_channel_stream_ends_when_trigger_dropped() {
        let (trigger, source) = ChannelTermination::new();
        let mut stream = source.listen().unwrap();
        drop(trigger);
        assert_eq!(stream.next().await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_os_signals_install() {
        let stream = OsSignals::default().listen();
        assert!(stream.is_ok());
    }
}
