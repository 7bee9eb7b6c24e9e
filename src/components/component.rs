//! # Managed component contract.
//!
//! A [`Component`] is anything with an independent start/stop lifecycle: a network
//! server, a consumer loop, a background job. The [`App`](crate::App) never creates or
//! destroys components; it only calls these two methods.
//!
//! ## Contract
//! - `start` may run for the whole life of the component. It must treat cancellation of
//!   `ctx` as the trigger to unwind, and may return [`ComponentError::Canceled`] (or `Ok`)
//!   when it does.
//! - `stop` is called once cancellation is observed, possibly after `start` already
//!   returned, and must tolerate that.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use servekit::{Component, ComponentError, RunContext};
//!
//! struct Ticker;
//!
//! #[async_trait]
//! impl Component for Ticker {
//!     fn name(&self) -> &str { "ticker" }
//!
//!     async fn start(&self, ctx: RunContext) -> Result<(), ComponentError> {
//!         ctx.cancelled().await;
//!         Err(ComponentError::Canceled)
//!     }
//!
//!     async fn stop(&self, _ctx: RunContext) -> Result<(), ComponentError> {
//!         Ok(())
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::RunContext;
use crate::error::ComponentError;

/// Unit with an independent start/stop lifecycle, supervised by the app.
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Returns a stable, human-readable name (used in errors and events).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs the component until it finishes or `ctx` is cancelled.
    async fn start(&self, ctx: RunContext) -> Result<(), ComponentError>;

    /// Shuts the component down; `ctx` is already cancelled when this is called.
    async fn stop(&self, ctx: RunContext) -> Result<(), ComponentError>;
}

/// Shared handle to a component.
pub type ComponentRef = Arc<dyn Component>;
