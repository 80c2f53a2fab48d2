//! Declarative targets manifest.
//!
//! A `Targets.toml` file declares targets as data. Loading it produces a
//! [`TargetRegistry`](crate::target::TargetRegistry) whose bodies run the
//! declared steps, resolving placeholders against the build context.

mod load;
mod types;

pub use load::ManifestError;
pub use types::*;
