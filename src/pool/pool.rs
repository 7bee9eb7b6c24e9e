//! # Bounded worker pool.
//!
//! [`Pool`] runs submitted [`Task`]s on at most `capacity` tokio tasks ("workers").
//! Workers are spawned lazily by `submit` and live until the pool is closed; they are
//! counted, not tracked individually.
//!
//! ## Lifecycle
//! ```text
//! Pool::new(cap) ──► Running ──close()──► Stopped (irreversible)
//!
//! submit(task):
//!   ├─► state == Stopped ─► Err(Closed)
//!   ├─► running_workers < cap ─► spawn worker (compare-and-increment gate)
//!   └─► queue.send(task).await      (waits while the queue is full)
//!
//! close():
//!   ├─► state = Stopped
//!   ├─► wait until queue is empty   (woken by workers on every dequeue)
//!   └─► drop the sender             (workers observe end-of-stream and exit)
//!
//! shutdown():
//!   └─► close() + wait for every worker to exit
//! ```
//!
//! ## Rules
//! - `running_workers` never exceeds `capacity`.
//! - The state check in `submit` is optimistic: a submission racing with `close` may
//!   still be enqueued. Such a task is still executed, since the queue stays open until
//!   the racing sender is dropped.
//! - `close` does not wait for in-flight tasks to finish; `shutdown` does.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

use crate::error::PoolError;

use super::builder::PoolBuilder;
use super::task::Task;
use super::worker::{self, PanicHandler, Shared};

/// Pool state, transitions `Running → Stopped` once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Running,
    Stopped,
}

/// State and queue sender, guarded together so close cannot race with itself.
struct Gate {
    state: PoolState,
    sender: Option<mpsc::Sender<Task>>,
}

/// Bounded pool of lazily spawned workers draining a FIFO queue.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use servekit::Pool;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), servekit::PoolError> {
/// let pool = Pool::new(4)?;
/// let hits = Arc::new(AtomicUsize::new(0));
///
/// for _ in 0..10 {
///     pool.spawn(|hits: Arc<AtomicUsize>| async move {
///         hits.fetch_add(1, Ordering::SeqCst);
///     }, hits.clone()).await?;
/// }
///
/// pool.shutdown().await;
/// assert_eq!(hits.load(Ordering::SeqCst), 10);
/// # Ok(())
/// # }
/// ```
pub struct Pool {
    capacity: usize,
    gate: Mutex<Gate>,
    shared: Arc<Shared>,
    tracker: TaskTracker,
}

impl Pool {
    /// Creates a pool with the given capacity and no panic handler.
    ///
    /// Returns [`PoolError::InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, PoolError> {
        Self::builder(capacity).build()
    }

    /// Starts building a pool with extra options.
    pub fn builder(capacity: usize) -> PoolBuilder {
        PoolBuilder::new(capacity)
    }

    pub(crate) fn with_handler(
        capacity: usize,
        on_panic: Option<PanicHandler>,
    ) -> Result<Self, PoolError> {
        if capacity == 0 {
            return Err(PoolError::InvalidCapacity);
        }
        let (tx, rx) = mpsc::channel::<Task>(capacity);
        Ok(Self {
            capacity,
            gate: Mutex::new(Gate {
                state: PoolState::Running,
                sender: Some(tx),
            }),
            shared: Arc::new(Shared::new(rx, on_panic)),
            tracker: TaskTracker::new(),
        })
    }

    /// Submits a task, waiting for a free queue slot if necessary.
    ///
    /// May start a new worker if fewer than `capacity` are alive.
    pub async fn submit(&self, task: Task) -> Result<(), PoolError> {
        let tx = self.sender()?;
        self.grow();
        tx.send(task).await.map_err(|_| PoolError::Closed)
    }

    /// Submits a task without waiting; returns [`PoolError::Full`] if the queue has no free slot.
    pub fn try_submit(&self, task: Task) -> Result<(), PoolError> {
        let tx = self.sender()?;
        self.grow();
        tx.try_send(task).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => PoolError::Full,
            mpsc::error::TrySendError::Closed(_) => PoolError::Closed,
        })
    }

    /// Shorthand for `submit(Task::new(handler, params))`.
    pub async fn spawn<H, P, Fut>(&self, handler: H, params: P) -> Result<(), PoolError>
    where
        H: FnOnce(P) -> Fut + Send + 'static,
        P: Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.submit(Task::new(handler, params)).await
    }

    /// Stops accepting tasks, waits until the queue is empty, then closes it.
    ///
    /// Idempotent: calls on a stopped pool return immediately. Tasks already dequeued
    /// may still be running when this returns.
    pub async fn close(&self) {
        let tx = {
            let mut gate = self.lock_gate();
            if gate.state == PoolState::Stopped {
                return;
            }
            gate.state = PoolState::Stopped;
            gate.sender.clone()
        };

        if let Some(tx) = tx {
            loop {
                let dequeued = self.shared.dequeued.notified();
                if queued_in(&tx) == 0 {
                    break;
                }
                dequeued.await;
            }
        }

        self.lock_gate().sender = None;
        tracing::debug!(capacity = self.capacity, "pool closed");
    }

    /// Closes the pool and waits until every worker has exited.
    pub async fn shutdown(&self) {
        self.close().await;
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Maximum number of concurrently live workers.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of workers currently alive.
    pub fn running_workers(&self) -> usize {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Number of tasks waiting in the queue (zero once closed).
    pub fn queued(&self) -> usize {
        self.lock_gate().sender.as_ref().map_or(0, queued_in)
    }

    /// Current pool state.
    pub fn state(&self) -> PoolState {
        self.lock_gate().state
    }

    /// True once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.state() == PoolState::Stopped
    }

    /// Returns a sender if the pool is still running.
    fn sender(&self) -> Result<mpsc::Sender<Task>, PoolError> {
        let gate = self.lock_gate();
        match (&gate.state, &gate.sender) {
            (PoolState::Running, Some(tx)) => Ok(tx.clone()),
            _ => Err(PoolError::Closed),
        }
    }

    /// Starts one more worker if the cap allows it.
    fn grow(&self) {
        let cap = self.capacity;
        let admitted = self
            .shared
            .running
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < cap).then_some(n + 1)
            })
            .is_ok();

        if admitted {
            self.tracker.spawn(worker::run(Arc::clone(&self.shared)));
        }
    }

    fn lock_gate(&self) -> MutexGuard<'_, Gate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn queued_in(tx: &mpsc::Sender<Task>) -> usize {
    tx.max_capacity() - tx.capacity()
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("capacity", &self.capacity)
            .field("running_workers", &self.running_workers())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio::time::timeout;

    fn counting_task(counter: &Arc<AtomicUsize>) -> Task {
        Task::new(
            |c: Arc<AtomicUsize>| async move {
                c.fetch_add(1, Ordering::SeqCst);
            },
            Arc::clone(counter),
        )
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert_eq!(Pool::new(0).err(), Some(PoolError::InvalidCapacity));
    }

    #[test]
    fn test_positive_capacities_are_accepted() {
        for cap in [1, 2, 7, 64, 1024] {
            let pool = Pool::new(cap).expect("positive capacity");
            assert_eq!(pool.capacity(), cap);
            assert_eq!(pool.state(), PoolState::Running);
        }
    }

    #[tokio::test]
    async fn test_workers_are_spawned_lazily() {
        let pool = Pool::new(4).unwrap();
        assert_eq!(pool.running_workers(), 0);

        let counter = Arc::new(AtomicUsize::new(0));
        pool.submit(counting_task(&counter)).await.unwrap();
        assert_eq!(pool.running_workers(), 1);

        pool.shutdown().await;
        assert_eq!(pool.running_workers(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_after_close_is_rejected() {
        let pool = Pool::new(2).unwrap();
        pool.close().await;
        assert!(pool.is_closed());

        let counter = Arc::new(AtomicUsize::new(0));
        assert_eq!(pool.submit(counting_task(&counter)).await, Err(PoolError::Closed));
        assert_eq!(pool.try_submit(counting_task(&counter)), Err(PoolError::Closed));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let pool = Pool::new(1).unwrap();
        pool.close().await;
        pool.close().await;
        pool.shutdown().await;
        assert_eq!(pool.state(), PoolState::Stopped);
        assert_eq!(pool.queued(), 0);
    }

    #[tokio::test]
    async fn test_all_submitted_tasks_run() {
        let pool = Pool::new(4).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..200 {
            pool.submit(counting_task(&counter)).await.unwrap();
            assert!(pool.running_workers() <= pool.capacity());
        }

        timeout(Duration::from_secs(5), pool.shutdown())
            .await
            .expect("pool drains");
        assert_eq!(counter.load(Ordering::SeqCst), 200);
    }

    #[tokio::test]
    async fn test_single_worker_runs_tasks_in_submission_order() {
        let pool = Pool::new(1).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..10 {
            pool.spawn(
                move |seen: Arc<Mutex<Vec<usize>>>| async move {
                    seen.lock().unwrap().push(i);
                },
                Arc::clone(&seen),
            )
            .await
            .unwrap();
        }
        pool.shutdown().await;

        assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_stop_later_tasks() {
        let pool = Pool::new(1).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        pool.submit(Task::from_future(async {
            panic!("task A failed");
        }))
        .await
        .unwrap();
        pool.submit(counting_task(&counter)).await.unwrap();

        pool.shutdown().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panic_handler_receives_fault() {
        let faults = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&faults);
        let pool = Pool::builder(2)
            .with_panic_handler(move |fault| sink.lock().unwrap().push(fault.message().to_string()))
            .build()
            .unwrap();

        pool.submit(Task::from_future(async {
            panic!("boom");
        }))
        .await
        .unwrap();
        pool.shutdown().await;

        assert_eq!(*faults.lock().unwrap(), vec!["boom".to_string()]);
    }

    #[tokio::test]
    async fn test_panicking_panic_handler_is_contained() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = Pool::builder(1)
            .with_panic_handler(|_| panic!("handler exploded"))
            .build()
            .unwrap();

        pool.submit(Task::from_future(async {
            panic!("first");
        }))
        .await
        .unwrap();
        pool.submit(counting_task(&counter)).await.unwrap();
        pool.shutdown().await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_try_submit_reports_full_queue() {
        let pool = Pool::new(1).unwrap();
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let (s, r) = (Arc::clone(&started), Arc::clone(&release));
        let started_fut = started.notified();
        pool.submit(Task::from_future(async move {
            s.notify_one();
            r.notified().await;
        }))
        .await
        .unwrap();
        started_fut.await;

        // The only worker is busy; one queue slot remains.
        let counter = Arc::new(AtomicUsize::new(0));
        assert_eq!(pool.try_submit(counting_task(&counter)), Ok(()));
        assert_eq!(pool.queued(), 1);
        assert_eq!(pool.try_submit(counting_task(&counter)), Err(PoolError::Full));

        release.notify_one();
        pool.shutdown().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_waits_for_queue_to_drain() {
        let pool = Arc::new(Pool::new(1).unwrap());
        let release = Arc::new(Notify::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let r = Arc::clone(&release);
        pool.submit(Task::from_future(async move { r.notified().await }))
            .await
            .unwrap();
        pool.submit(counting_task(&counter)).await.unwrap();

        let closer = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.close().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!closer.is_finished(), "close must wait while tasks are queued");
        assert!(pool.is_closed());

        release.notify_one();
        timeout(Duration::from_secs(5), closer)
            .await
            .expect("close returns once drained")
            .unwrap();
        pool.shutdown().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submitters_respect_capacity() {
        let pool = Arc::new(Pool::new(3).unwrap());
        let counter = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut submitters = Vec::new();
        for _ in 0..8 {
            let (pool, counter, peak) = (pool.clone(), counter.clone(), peak.clone());
            submitters.push(tokio::spawn(async move {
                for _ in 0..50 {
                    pool.submit(counting_task(&counter)).await.unwrap();
                    peak.fetch_max(pool.running_workers(), Ordering::SeqCst);
                }
            }));
        }
        for s in submitters {
            s.await.unwrap();
        }

        timeout(Duration::from_secs(5), pool.shutdown())
            .await
            .expect("pool drains");
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(counter.load(Ordering::SeqCst), 400);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_submit_racing_close_is_either_rejected_or_executed() {
        let pool = Arc::new(Pool::new(2).unwrap());
        let counter = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::new(AtomicUsize::new(0));

        let submitter = {
            let (pool, counter, accepted) = (pool.clone(), counter.clone(), accepted.clone());
            tokio::spawn(async move {
                for _ in 0..100 {
                    match pool.submit(counting_task(&counter)).await {
                        Ok(()) => {
                            accepted.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(e) => {
                            assert_eq!(e, PoolError::Closed);
                            break;
                        }
                    }
                }
            })
        };
        tokio::task::yield_now().await;
        pool.close().await;
        submitter.await.unwrap();
        pool.shutdown().await;

        assert_eq!(
            counter.load(Ordering::SeqCst),
            accepted.load(Ordering::SeqCst),
            "every accepted task runs, including one racing with close"
        );
    }
}
