use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{
    app::App,
    config::Config,
    context::AppInfo,
    signals::{OsSignals, Signal, Termination},
};
use crate::{components::ComponentRef, events::Bus, subscribers::Subscribe};

/// Builder for constructing an [`App`].
pub struct AppBuilder {
    cfg: Config,
    components: Vec<ComponentRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    termination: Option<Arc<dyn Termination>>,
    parent: Option<CancellationToken>,
}

impl AppBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            components: Vec::new(),
            subscribers: Vec::new(),
            termination: None,
            parent: None,
        }
    }

    /// Registers one component. Registration order is kept.
    pub fn with_component(mut self, component: ComponentRef) -> Self {
        self.components.push(component);
        self
    }

    /// Registers several components.
    pub fn with_components(mut self, components: impl IntoIterator<Item = ComponentRef>) -> Self {
        self.components.extend(components);
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the termination source (default: [`OsSignals`] over `Config::signals`).
    pub fn with_termination(mut self, termination: impl Termination) -> Self {
        self.termination = Some(Arc::new(termination));
        self
    }

    /// Overrides the watched OS signals.
    pub fn with_signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.cfg.signals = signals.into_iter().collect();
        self
    }

    /// Links the app to an outer token: cancelling `parent` stops the app.
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builds the app. No task is spawned until [`App::run`].
    pub fn build(self) -> Arc<App> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let token = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let termination = self
            .termination
            .unwrap_or_else(|| Arc::new(OsSignals::new(self.cfg.signals.iter().copied())));
        let info = AppInfo::new(
            self.cfg.resolve_id(),
            self.cfg.name,
            self.cfg.version,
            self.cfg.metadata,
        );

        Arc::new(App::new_internal(
            info,
            token,
            self.components,
            termination,
            bus,
            self.subscribers,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_resolves_identity() {
        let app = AppBuilder::new(Config::new("api", "1.0.0")).build();
        assert_eq!(app.name(), "api");
        assert_eq!(app.version(), "1.0.0");
        assert!(!app.id().is_empty());
    }

    #[test]
    fn test_parent_cancellation_reaches_app() {
        let parent = CancellationToken::new();
        let app = AppBuilder::new(Config::default()).with_parent(parent.clone()).build();
        parent.cancel();
        assert!(app.token().is_cancelled());
    }

    #[test]
    fn test_app_stop_does_not_cancel_parent() {
        let parent = CancellationToken::new();
        let app = AppBuilder::new(Config::default()).with_parent(parent.clone()).build();
        assert!(app.stop());
        assert!(!parent.is_cancelled());
    }
}
