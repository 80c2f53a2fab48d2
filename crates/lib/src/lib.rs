//! targetry-lib: declarative build-target execution engine
//!
//! Build steps ("targets") declare named prerequisites and platform
//! constraints. This crate resolves a goal into an ordered plan and runs each
//! target at most once against a shared build context:
//! - `target`: targets, their results and the registry
//! - `execute`: dependency resolution, the execution engine and run reports
//! - `context`: the key/value store and logging sink shared by target bodies
//! - `platform`: host detection and platform gating
//! - `manifest`: loading targets from a `Targets.toml` file
//! - `action`: leaf actions (commands, package cache refresh)

pub mod action;
pub mod config;
pub mod consts;
pub mod context;
pub mod execute;
pub mod manifest;
pub mod placeholder;
pub mod platform;
pub mod target;
pub mod util;
