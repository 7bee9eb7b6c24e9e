//! # Pool worker loop.
//!
//! Workers share one receiving end of the bounded queue. Each worker:
//!
//! ```text
//! loop {
//!   ├─► lock receiver, recv()
//!   │     ├─ None (queue closed and empty) ─► exit, running_workers -= 1
//!   │     └─ Some(task)
//!   ├─► notify drain waiters (Pool::close)
//!   └─► catch_panic(task.run())
//!         └─ Err(fault) ─► panic handler, or tracing::error!
//! }
//! ```
//!
//! ## Rules
//! - A panicking task never ends the worker; the loop continues with the next receive.
//! - Tasks are received in FIFO order; different workers complete them in any order.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, Notify, mpsc};

use crate::error::Fault;
use crate::guard::catch_panic;

use super::task::Task;

/// Custom observer for panics caught inside tasks.
pub type PanicHandler = Arc<dyn Fn(Fault) + Send + Sync + 'static>;

/// State shared between the pool handle and its workers.
///
/// Holds no sender, so dropping the pool is enough to close the queue.
pub(crate) struct Shared {
    pub(crate) receiver: Mutex<mpsc::Receiver<Task>>,
    pub(crate) running: AtomicUsize,
    pub(crate) dequeued: Notify,
    pub(crate) on_panic: Option<PanicHandler>,
}

impl Shared {
    pub(crate) fn new(receiver: mpsc::Receiver<Task>, on_panic: Option<PanicHandler>) -> Self {
        Self {
            receiver: Mutex::new(receiver),
            running: AtomicUsize::new(0),
            dequeued: Notify::new(),
            on_panic,
        }
    }

    /// Reports a caught panic to the handler, or logs it.
    fn report(&self, fault: Fault) {
        match &self.on_panic {
            Some(handler) => {
                // A panicking handler must not take the worker down either.
                if let Err(nested) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    handler(fault)
                })) {
                    tracing::error!(
                        panic = %crate::guard::panic_message(&*nested),
                        "pool panic handler panicked"
                    );
                }
            }
            None => tracing::error!(panic = %fault.message(), "pool task panicked"),
        }
    }
}

/// Runs one worker until the queue is closed and drained.
///
/// The caller has already counted this worker in `shared.running`.
pub(crate) async fn run(shared: Arc<Shared>) {
    tracing::debug!("pool worker started");
    loop {
        let next = {
            let mut rx = shared.receiver.lock().await;
            rx.recv().await
        };
        let Some(task) = next else { break };
        shared.dequeued.notify_waiters();

        if let Err(fault) = catch_panic(task.run()).await {
            shared.report(fault);
        }
    }
    shared.running.fetch_sub(1, Ordering::AcqRel);
    tracing::debug!("pool worker exited");
}
