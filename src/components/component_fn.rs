//! # Function-backed component (`ComponentFn`)
//!
//! [`ComponentFn`] builds a [`Component`] from two closures, each producing a fresh
//! future per call. Shared state goes in an `Arc` captured by both closures.
//!
//! ## Example
//! ```rust
//! use servekit::{ComponentError, ComponentFn, ComponentRef, RunContext};
//!
//! let c: ComponentRef = ComponentFn::arc(
//!     "worker",
//!     |ctx: RunContext| async move {
//!         ctx.cancelled().await;
//!         Ok::<_, ComponentError>(())
//!     },
//!     |_ctx: RunContext| async { Ok::<_, ComponentError>(()) },
//! );
//! assert_eq!(c.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::components::Component;
use crate::core::RunContext;
use crate::error::ComponentError;

/// Component implemented by a start closure and a stop closure.
pub struct ComponentFn<S, T> {
    name: Cow<'static, str>,
    start: S,
    stop: T,
}

impl<S, T> ComponentFn<S, T> {
    /// Creates a new function-backed component.
    pub fn new(name: impl Into<Cow<'static, str>>, start: S, stop: T) -> Self {
        Self {
            name: name.into(),
            start,
            stop,
        }
    }

    /// Creates the component and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, start: S, stop: T) -> Arc<Self> {
        Arc::new(Self::new(name, start, stop))
    }
}

#[async_trait]
impl<S, SF, T, TF> Component for ComponentFn<S, T>
where
    S: Fn(RunContext) -> SF + Send + Sync + 'static,
    SF: Future<Output = Result<(), ComponentError>> + Send + 'static,
    T: Fn(RunContext) -> TF + Send + Sync + 'static,
    TF: Future<Output = Result<(), ComponentError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, ctx: RunContext) -> Result<(), ComponentError> {
        (self.start)(ctx).await
    }

    async fn stop(&self, ctx: RunContext) -> Result<(), ComponentError> {
        (self.stop)(ctx).await
    }
}
