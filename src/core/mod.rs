//! Runtime core: lifecycle orchestration.
//!
//! The only entry point from this module is [`App`], built through [`AppBuilder`].
//!
//! Internal modules:
//! - [`app`]: starts components, watches for termination, stops everything once;
//! - [`group`]: task group where the first completion cancels the rest;
//! - [`signals`]: termination sources (OS signals, in-process channel);
//! - [`context`]: app identity and the per-run context handed to components.

mod app;
mod builder;
mod config;
mod context;
mod group;
mod signals;

pub use app::{App, AppState};
pub use builder::AppBuilder;
pub use config::Config;
pub use context::{AppInfo, RunContext};
pub use signals::{
    ChannelTermination, OsSignals, Signal, SignalStream, Termination, TerminationTrigger,
};
