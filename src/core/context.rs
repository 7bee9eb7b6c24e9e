//! # App identity and the per-run context handed to components.
//!
//! [`AppInfo`] is fixed when the app is built. [`RunContext`] pairs it with the
//! cancellation token of the current run, and is what `Component::start`/`stop`
//! receive: code that needs the identity (a registry client, a metrics exporter) reads it
//! from there instead of from ambient state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Read-only identity of an app instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    id: String,
    name: String,
    version: String,
    metadata: HashMap<String, String>,
}

impl AppInfo {
    /// Creates an identity.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        metadata: HashMap<String, String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            metadata,
        }
    }

    /// Instance id (random UUID unless configured).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Service version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Free-form metadata.
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }
}

/// Context of one app run, cheap to clone.
#[derive(Debug, Clone)]
pub struct RunContext {
    token: CancellationToken,
    info: Arc<AppInfo>,
}

impl RunContext {
    pub(crate) fn new(token: CancellationToken, info: Arc<AppInfo>) -> Self {
        Self { token, info }
    }

    /// Identity of the app running this component.
    pub fn info(&self) -> &AppInfo {
        &self.info
    }

    /// Token cancelled when the app starts shutting down.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// True once shutdown has begun.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when shutdown begins.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Derives a token cancelled together with this run, but cancellable on its own.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_exposes_identity_and_token() {
        let info = Arc::new(AppInfo::new(
            "id-1",
            "billing",
            "1.2.3",
            HashMap::from([("region".to_string(), "eu".to_string())]),
        ));
        let ctx = RunContext::new(CancellationToken::new(), info);

        assert_eq!(ctx.info().name(), "billing");
        assert_eq!(ctx.info().metadata().get("region").map(String::as_str), Some("eu"));

        let child = ctx.child_token();
        child.cancel();
        assert!(!ctx.is_cancelled(), "child cancellation must not leak upward");

        ctx.token().cancel();
        assert!(ctx.is_cancelled());
    }
}
