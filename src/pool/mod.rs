//! # Bounded worker pool.
//!
//! - [`Pool`] - lazily grown, capped set of workers draining a bounded FIFO queue
//! - [`PoolBuilder`] - pool construction with a custom panic handler
//! - [`Task`] - handler plus parameters, run once by a worker
//!
//! The pool is independent of [`App`](crate::App); either can be used on its own.

mod builder;
#[allow(clippy::module_inception)]
mod pool;
mod task;
mod worker;

pub use builder::PoolBuilder;
pub use pool::{Pool, PoolState};
pub use task::Task;
pub use worker::PanicHandler;
