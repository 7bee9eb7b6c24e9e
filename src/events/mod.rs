//! Runtime events: types and broadcast bus.
//!
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! Publishers are the app's starter/stopper/watcher tasks and the subscriber workers
//! (overflow/panic). The only consumer is the listener spawned by `App::run`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
