//! # App: starts components, watches for termination, stops everything once.
//!
//! The [`App`] owns the root cancellation token, the registered components, the event
//! bus and the termination source.
//!
//! ## High-level architecture
//! ```text
//! App::run()
//!   ├─► subscriber_listener(): Bus.subscribe() ─► SubscriberSet::emit(Event)
//!   │
//!   ├─► for each component (all in one Group, token = root.child_token()):
//!   │     ├─ stopper: ctx.cancelled().await ─► component.stop(ctx)
//!   │     └─ starter: latch.arrive()        ─► component.start(ctx)
//!   │
//!   ├─► latch.wait(n)        (every start has been dispatched)
//!   ├─► termination.listen() (install the signal watcher)
//!   │
//!   ├─► loop select:
//!   │     ├─ group token cancelled ─► break
//!   │     └─ signal ─► publish SignalReceived, stop(), keep looping
//!   │
//!   ├─► group.wait() ─► first non-cancellation error, or Ok(())
//!   └─► publish AppStopped, drain subscribers, return
//! ```
//!
//! ## Rules
//! - The first member of the group to finish (start returned, stop returned, panic)
//!   cancels the group, so one exiting component stops all of them.
//! - `stop()` cancels the root token at most once; later calls are no-ops.
//! - No timeout is applied to `stop`: a hanging component keeps `run` waiting.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use servekit::{App, ComponentError, ComponentFn, Config, RunContext};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let worker = ComponentFn::arc(
//!         "worker",
//!         |ctx: RunContext| async move {
//!             ctx.cancelled().await;
//!             Err::<(), _>(ComponentError::Canceled)
//!         },
//!         |_ctx: RunContext| async { Ok::<_, ComponentError>(()) },
//!     );
//!
//!     let app = App::builder(Config::new("demo", "0.1.0"))
//!         .with_component(worker)
//!         .build();
//!
//!     let handle = Arc::clone(&app);
//!     tokio::spawn(async move { handle.stop() });
//!
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use futures::StreamExt;
use tokio::sync::{Semaphore, broadcast::error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::components::ComponentRef;
use crate::core::builder::AppBuilder;
use crate::core::config::Config;
use crate::core::context::{AppInfo, RunContext};
use crate::core::group::Group;
use crate::core::signals::{SignalStream, Termination};
use crate::error::{Phase, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::guard::catch_panic;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Lifecycle state of an [`App`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AppState {
    /// Built, `run` not called yet.
    Created = 0,
    /// `run` is starting or supervising components.
    Running = 1,
    /// Cancellation fired; components are being stopped.
    Stopping = 2,
    /// `run` finished.
    Stopped = 3,
}

impl AppState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => AppState::Created,
            1 => AppState::Running,
            2 => AppState::Stopping,
            _ => AppState::Stopped,
        }
    }
}

/// Coordinates component start/stop, termination signals and event delivery.
pub struct App {
    info: Arc<AppInfo>,
    token: CancellationToken,
    components: Vec<ComponentRef>,
    termination: Arc<dyn Termination>,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
    state: AtomicU8,
    stop_fired: AtomicBool,
}

impl App {
    /// Starts building an app from the given configuration.
    pub fn builder(cfg: Config) -> AppBuilder {
        AppBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        info: AppInfo,
        token: CancellationToken,
        components: Vec<ComponentRef>,
        termination: Arc<dyn Termination>,
        bus: Bus,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        Self {
            info: Arc::new(info),
            token,
            components,
            termination,
            bus,
            subscribers,
            state: AtomicU8::new(AppState::Created as u8),
            stop_fired: AtomicBool::new(false),
        }
    }

    /// Instance id.
    pub fn id(&self) -> &str {
        self.info.id()
    }

    /// Service name.
    pub fn name(&self) -> &str {
        self.info.name()
    }

    /// Service version.
    pub fn version(&self) -> &str {
        self.info.version()
    }

    /// Service metadata.
    pub fn metadata(&self) -> &HashMap<String, String> {
        self.info.metadata()
    }

    /// Shared identity handle.
    pub fn info(&self) -> Arc<AppInfo> {
        Arc::clone(&self.info)
    }

    /// Root cancellation token (cancelled by [`stop`](Self::stop)).
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AppState {
        AppState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Event bus; subscribe to observe lifecycle events directly.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Requests a graceful stop by cancelling the root token.
    ///
    /// Idempotent and callable from any task, including component bodies.
    /// Returns `true` only for the call that fired the cancellation.
    pub fn stop(&self) -> bool {
        if self.stop_fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.bus.publish(Event::new(EventKind::StopRequested));
        self.token.cancel();
        self.mark_stopping();
        true
    }

    /// `Running → Stopping`; no-op in any other state.
    fn mark_stopping(&self) {
        let _ = self.state.compare_exchange(
            AppState::Running as u8,
            AppState::Stopping as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Runs every component until cancellation, then stops them all.
    ///
    /// Returns `Ok(())` on a clean shutdown, or the first real error reported by a
    /// component's `start` or `stop`.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        if self
            .state
            .compare_exchange(
                AppState::Created as u8,
                AppState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(RuntimeError::AlreadyStarted);
        }
        let listener_done = CancellationToken::new();
        let listener = self.subscriber_listener(listener_done.clone());
        self.bus.publish(Event::new(EventKind::AppStarting));

        let mut group = Group::new(self.token.child_token());
        let ctx = RunContext::new(group.token().clone(), Arc::clone(&self.info));
        let latch = self.spawn_components(&mut group, &ctx);

        // Every starter adds exactly one permit.
        let count = u32::try_from(self.components.len()).unwrap_or(u32::MAX);
        if let Ok(permits) = latch.acquire_many(count).await {
            permits.forget();
        }

        let res = match self.termination.listen() {
            Ok(signals) => {
                self.bus.publish(
                    Event::new(EventKind::AppRunning).with_reason(self.components.len().to_string()),
                );
                self.watch(signals, group.token()).await;
                group.wait().await
            }
            Err(e) => {
                tracing::error!(app = %self.info.name(), error = %e, "termination source failed");
                group.token().cancel();
                self.mark_stopping();
                let _ = group.wait().await;
                Err(e)
            }
        };

        self.state.store(AppState::Stopped as u8, Ordering::Release);
        let mut stopped = Event::new(EventKind::AppStopped);
        if let Err(e) = &res {
            stopped = stopped.with_reason(e.as_label());
        }
        self.bus.publish(stopped);

        listener_done.cancel();
        if let Some(handle) = listener {
            let _ = handle.await;
        }
        tracing::debug!(app = %self.info.name(), ok = res.is_ok(), "app run finished");
        res
    }

    /// Forwards bus events to the subscriber set until `done` fires, then drains.
    fn subscriber_listener(&self, done: CancellationToken) -> Option<JoinHandle<()>> {
        if self.subscribers.is_empty() {
            return None;
        }
        let mut rx = self.bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone(), self.bus.clone());
        Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(Arc::new(ev)),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = done.cancelled() => {
                        while let Ok(ev) = rx.try_recv() {
                            set.emit(Arc::new(ev));
                        }
                        break;
                    }
                }
            }
            set.shutdown().await;
        }))
    }

    /// Spawns a stopper and a starter per component; returns the start latch.
    fn spawn_components(&self, group: &mut Group, ctx: &RunContext) -> Arc<Semaphore> {
        let latch = Arc::new(Semaphore::new(0));

        for component in &self.components {
            let (c, ctx_stop, bus) = (Arc::clone(component), ctx.clone(), self.bus.clone());
            group.spawn(component.name(), Phase::Stop, async move {
                ctx_stop.cancelled().await;
                stop_component(c, ctx_stop, bus).await
            });

            let (c, ctx_start, bus) = (Arc::clone(component), ctx.clone(), self.bus.clone());
            let arrived = Arc::clone(&latch);
            group.spawn(component.name(), Phase::Start, async move {
                arrived.add_permits(1);
                start_component(c, ctx_start, bus).await
            });
        }
        latch
    }

    /// Turns termination events into `stop()` until the group is cancelled.
    async fn watch(&self, mut signals: SignalStream, done: &CancellationToken) {
        let mut open = true;
        loop {
            tokio::select! {
                _ = done.cancelled() => break,
                next = signals.next(), if open => match next {
                    Some(signal) => {
                        self.bus.publish(Event::new(EventKind::SignalReceived).with_signal(signal));
                        self.stop();
                    }
                    None => open = false,
                },
            }
        }
        self.mark_stopping();
    }
}

async fn start_component(c: ComponentRef, ctx: RunContext, bus: Bus) -> Result<(), RuntimeError> {
    let name = c.name().to_string();
    bus.publish(Event::new(EventKind::ComponentStarting).with_component(name.as_str()));

    match catch_panic(c.start(ctx)).await {
        Ok(Ok(())) => {
            bus.publish(Event::new(EventKind::ComponentExited).with_component(name));
            Ok(())
        }
        Ok(Err(e)) if e.is_canceled() => {
            bus.publish(Event::new(EventKind::ComponentExited).with_component(name));
            Ok(())
        }
        Ok(Err(e)) => {
            bus.publish(
                Event::new(EventKind::ComponentStartFailed)
                    .with_component(name.as_str())
                    .with_reason(e.to_string()),
            );
            Err(RuntimeError::ComponentStart {
                component: name,
                source: e,
            })
        }
        Err(fault) => {
            bus.publish(
                Event::new(EventKind::ComponentPanicked)
                    .with_component(name.as_str())
                    .with_reason(fault.message()),
            );
            Err(RuntimeError::ComponentPanicked {
                component: name,
                phase: Phase::Start,
                fault,
            })
        }
    }
}

async fn stop_component(c: ComponentRef, ctx: RunContext, bus: Bus) -> Result<(), RuntimeError> {
    let name = c.name().to_string();
    bus.publish(Event::new(EventKind::ComponentStopping).with_component(name.as_str()));

    match catch_panic(c.stop(ctx)).await {
        Ok(Ok(())) => {
            bus.publish(Event::new(EventKind::ComponentStopped).with_component(name));
            Ok(())
        }
        Ok(Err(e)) if e.is_canceled() => {
            bus.publish(Event::new(EventKind::ComponentStopped).with_component(name));
            Ok(())
        }
        Ok(Err(e)) => {
            bus.publish(
                Event::new(EventKind::ComponentStopFailed)
                    .with_component(name.as_str())
                    .with_reason(e.to_string()),
            );
            Err(RuntimeError::ComponentStop {
                component: name,
                source: e,
            })
        }
        Err(fault) => {
            bus.publish(
                Event::new(EventKind::ComponentPanicked)
                    .with_component(name.as_str())
                    .with_reason(fault.message()),
            );
            Err(RuntimeError::ComponentPanicked {
                component: name,
                phase: Phase::Stop,
                fault,
            })
        }
    }
}
