//! Targets and the registry that holds them.
//!
//! A [`Target`] is a named build step with declared dependencies, an optional
//! platform constraint and a body. Targets are registered once, before any
//! execution, into a [`TargetRegistry`].

pub mod registry;
pub mod types;

pub use registry::{RegistryError, TargetRegistry};
pub use types::{Target, TargetBody, TargetResult};
