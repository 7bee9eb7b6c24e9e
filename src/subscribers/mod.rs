//! # Event subscribers.
//!
//! ```text
//! App tasks ── publish(Event) ──► Bus ──► listener (App::run) ──► SubscriberSet
//!                                                                   ├──► LogWriter
//!                                                                   └──► custom ...
//! ```
//!
//! - [`Subscribe`] - the trait to implement for custom sinks
//! - [`SubscriberSet`] - per-subscriber queues and workers
//! - [`LogWriter`] - built-in subscriber writing through `tracing`

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
