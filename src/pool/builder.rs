use std::sync::Arc;

use crate::error::{Fault, PoolError};

use super::pool::Pool;
use super::worker::PanicHandler;

/// Builder for a [`Pool`] with optional panic handling.
pub struct PoolBuilder {
    capacity: usize,
    on_panic: Option<PanicHandler>,
}

impl PoolBuilder {
    /// Creates a builder for a pool of `capacity` workers.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            on_panic: None,
        }
    }

    /// Routes panics caught inside tasks to `handler` instead of the log.
    ///
    /// The handler runs on the worker that caught the panic, before it picks up the next task.
    pub fn with_panic_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(Fault) + Send + Sync + 'static,
    {
        self.on_panic = Some(Arc::new(handler));
        self
    }

    /// Builds the pool; fails with [`PoolError::InvalidCapacity`] for a zero capacity.
    pub fn build(self) -> Result<Pool, PoolError> {
        Pool::with_handler(self.capacity, self.on_panic)
    }
}
