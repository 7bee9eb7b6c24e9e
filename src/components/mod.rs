//! # Managed components.
//!
//! - [`Component`] - trait for anything with a start/stop lifecycle
//! - [`ComponentRef`] - shared handle (`Arc<dyn Component>`)
//! - [`ComponentFn`] - component built from two closures

mod component;
mod component_fn;

pub use component::{Component, ComponentRef};
pub use component_fn::ComponentFn;
