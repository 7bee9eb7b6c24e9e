//! # App configuration.
//!
//! Provides [`Config`], the identity and runtime settings of an [`App`](crate::App).
//! Components, subscribers and the termination source are added through the
//! [`AppBuilder`](crate::AppBuilder).
//!
//! ## Sentinel values
//! - `id = None` (or empty) → a random UUID is generated at build time
//! - `bus_capacity = 0` → clamped to 1

use std::collections::HashMap;

use uuid::Uuid;

use crate::core::signals::Signal;

/// Global configuration for an app instance.
///
/// ## Field semantics
/// - `id`: instance id; generated when absent
/// - `name`, `version`, `metadata`: identity reported through [`AppInfo`](crate::AppInfo)
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `signals`: OS signals watched when no custom termination source is set
#[derive(Clone, Debug)]
pub struct Config {
    /// Instance id. `None` means "generate one".
    pub id: Option<String>,

    /// Service name.
    pub name: String,

    /// Service version.
    pub version: String,

    /// Free-form metadata (region, zone, endpoints...).
    pub metadata: HashMap<String, String>,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,

    /// Signals that trigger a graceful stop (default: terminate, quit, interrupt).
    pub signals: Vec<Signal>,
}

impl Config {
    /// Creates a default config with the given name and version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Returns the configured id, or a fresh random UUID.
    pub fn resolve_id(&self) -> String {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `id = None` (random UUID)
    /// - empty `name`, `version` and `metadata`
    /// - `bus_capacity = 1024`
    /// - `signals = [SIGTERM, SIGQUIT, SIGINT]`
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            version: String::new(),
            metadata: HashMap::new(),
            bus_capacity: 1024,
            signals: Signal::DEFAULT_SET.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_id_generates_uuid_when_missing() {
        let cfg = Config::default();
        let a = cfg.resolve_id();
        let b = cfg.resolve_id();
        assert!(Uuid::parse_str(&a).is_ok());
        assert_ne!(a, b);

        let cfg = Config {
            id: Some(String::new()),
            ..Config::default()
        };
        assert!(Uuid::parse_str(&cfg.resolve_id()).is_ok());
    }

    #[test]
    fn test_resolve_id_keeps_configured() {
        let cfg = Config {
            id: Some("node-7".into()),
            ..Config::new("api", "2.0.0")
        };
        assert_eq!(cfg.resolve_id(), "node-7");
        assert_eq!(cfg.name, "api");
    }

    #[test]
    fn test_bus_capacity_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
