//! # Unit of work for the worker pool.
//!
//! A [`Task`] pairs a handler with the parameters it will be called with. It is inert
//! until a worker runs it, and it is consumed by that run: ownership moves from the
//! submitter to the queue and then to exactly one worker.
//!
//! ## Example
//! ```rust
//! use servekit::pool::Task;
//!
//! let task = Task::new(|(a, b): (u32, u32)| async move {
//!     assert_eq!(a + b, 3);
//! }, (1, 2));
//! # let _ = task;
//! ```

use std::fmt;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

type Invoke = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send + 'static>;

/// Handler plus captured parameters, executed once by a pool worker.
pub struct Task {
    invoke: Invoke,
}

impl Task {
    /// Creates a task that calls `handler(params)` when executed.
    pub fn new<H, P, Fut>(handler: H, params: P) -> Self
    where
        H: FnOnce(P) -> Fut + Send + 'static,
        P: Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            invoke: Box::new(move || handler(params).boxed()),
        }
    }

    /// Creates a task from a future that needs no parameters.
    pub fn from_future<Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            invoke: Box::new(move || fut.boxed()),
        }
    }

    /// Runs the handler to completion.
    ///
    /// The handler itself is called from inside the returned future, so a panic while
    /// building the future is observed by whoever polls it.
    pub(crate) async fn run(self) {
        (self.invoke)().await
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_task_passes_params_to_handler() {
        let sum = Arc::new(AtomicUsize::new(0));
        let task = Task::new(
            |(sum, values): (Arc<AtomicUsize>, Vec<usize>)| async move {
                sum.fetch_add(values.iter().sum(), Ordering::SeqCst);
            },
            (sum.clone(), vec![1, 2, 3]),
        );

        assert_eq!(sum.load(Ordering::SeqCst), 0, "task must be inert until run");
        task.run().await;
        assert_eq!(sum.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_handler_panic_surfaces_when_polled() {
        let task = Task::new(
            |msg: &'static str| {
                if !msg.is_empty() {
                    panic!("{msg}");
                }
                async {}
            },
            "early",
        );
        let res = crate::guard::catch_panic(task.run()).await;
        assert_eq!(res.unwrap_err().message(), "early");
    }
}
