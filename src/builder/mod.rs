//! Tauri CLI invocation and build orchestration.
//!
//! - [`executor`] runs external processes with bounded retry
//! - [`runner`] decides how the Tauri CLI is invoked for a project
//! - [`target`] models the `(platform, variant)` pairs a run builds
//! - [`orchestrator`] drives a full build-and-release run

pub mod executor;
pub mod orchestrator;
pub mod runner;
pub mod target;

pub use executor::{execute, retry};
pub use orchestrator::{BuildOptions, Orchestrator, ReleaseOptions, RunOutcome};
pub use runner::{PackageManager, Runner, resolve_runner};
pub use target::{BuildTarget, HostOs, MobileMode, Platform, Variant, build_targets, select_platform};
