//! # servekit
//!
//! **Servekit** is a small service-lifecycle toolkit for tokio applications.
//!
//! It provides two independent building blocks:
//! - an [`App`] that starts a set of long-running components concurrently, waits for a
//!   termination request (OS signal, explicit [`App::stop`], a parent token, or any
//!   component finishing) and then stops every component exactly once;
//! - a bounded [`Pool`] of lazily spawned workers that run submitted [`Task`]s with
//!   panic isolation and a graceful close.
//!
//! ## Architecture
//! ### App
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Component   │   │  Component   │   │  Component   │
//!     │ (http server)│   │ (grpc server)│   │  (consumer)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  App (lifecycle orchestrator)                                     │
//! │  - Group: starter + stopper per component, shared token           │
//! │  - start latch: signals are watched once every start dispatched   │
//! │  - Termination source (OsSignals / ChannelTermination)            │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        │ Publishes: AppStarting, ComponentStarting, SignalReceived,
//!        │            ComponentStopping, ComponentStopped, AppStopped ...
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                  (capacity: Config::bus_capacity)                 │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                    LogWriter   metrics    registry
//! ```
//!
//! ### Lifecycle
//! ```text
//! Created ──run()──► Running ──cancellation──► Stopping ──all stopped──► Stopped
//!
//! cancellation = stop() | termination signal | parent token | any component finishing
//! ```
//!
//! ### Pool
//! ```text
//! submit(task) ──► bounded FIFO (capacity N) ──► worker 1..N (spawned on demand)
//!                                                  └─ panic ─► PanicHandler / tracing
//! close(): Stopped ─► wait until queue empty ─► close queue
//! shutdown(): close() ─► wait for every worker to exit
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                       |
//! |-------------------|--------------------------------------------------------------|------------------------------------------|
//! | **Lifecycle**     | Start components, wait for termination, stop them once.      | [`App`], [`AppBuilder`], [`AppState`]    |
//! | **Components**    | Anything with a start/stop pair.                             | [`Component`], [`ComponentFn`]           |
//! | **Termination**   | OS signals or in-process triggers.                           | [`Termination`], [`OsSignals`]           |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, registries).   | [`Subscribe`], [`LogWriter`]             |
//! | **Worker pool**   | Bounded, lazily grown worker set with panic isolation.       | [`Pool`], [`PoolBuilder`], [`Task`]      |
//! | **Errors**        | Typed errors for orchestration, components and the pool.     | [`RuntimeError`], [`ComponentError`], [`PoolError`] |
//! | **Configuration** | Identity and runtime settings.                               | [`Config`], [`AppInfo`]                  |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use servekit::{App, ComponentError, ComponentFn, Config, LogWriter, Pool, RunContext, Subscribe, Task};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = Arc::new(Pool::new(4)?);
//!
//!     let jobs = Arc::clone(&pool);
//!     let producer = ComponentFn::arc(
//!         "producer",
//!         move |_ctx: RunContext| {
//!             let jobs = Arc::clone(&jobs);
//!             async move {
//!                 for n in 0..8u64 {
//!                     jobs.submit(Task::new(|n: u64| async move { let _ = n * 2; }, n))
//!                         .await
//!                         .map_err(ComponentError::failed)?;
//!                 }
//!                 Ok::<_, ComponentError>(())
//!             }
//!         },
//!         |_ctx: RunContext| async { Ok::<_, ComponentError>(()) },
//!     );
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
//!     let app = App::builder(Config::new("demo", "0.1.0"))
//!         .with_component(producer)
//!         .with_subscribers(subs)
//!         .build();
//!
//!     // The producer returning ends the run.
//!     app.run().await?;
//!     pool.shutdown().await;
//!     Ok(())
//! }
//! ```
mod components;
mod core;
mod error;
mod events;
mod subscribers;

pub mod guard;
pub mod pool;

// ---- Public re-exports ----

pub use components::{Component, ComponentFn, ComponentRef};
pub use core::{
    App, AppBuilder, AppInfo, AppState, ChannelTermination, Config, OsSignals, RunContext, Signal,
    SignalStream, Termination, TerminationTrigger,
};
pub use error::{ComponentError, Fault, Phase, PoolError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use pool::{Pool, PoolBuilder, PoolState, Task};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
