//! Build Tauri apps in CI and publish their bundles.
//!
//! This library drives the Tauri CLI for desktop, Android and iOS builds,
//! finds the bundles it produced and uploads them to a GitHub release together
//! with an updater `latest.json`:
//! - [`builder`] resolves the CLI invocation and orchestrates a run
//! - [`artifacts`] knows where each platform writes its bundles
//! - [`metadata`] reads app name, version and signing layout from the project
//! - [`release`] talks to GitHub and builds the updater manifest
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod artifacts;
pub mod builder;
pub mod cli;
pub mod error;
pub mod metadata;
pub mod release;

// Re-export commonly used types
pub use artifacts::Artifact;
pub use builder::{BuildOptions, Orchestrator, ReleaseOptions, RunOutcome};
pub use error::{ActionError, CliError, Result};
pub use metadata::ProjectInfo;
pub use release::{GitHubClient, ReleaseClient, ReleaseTarget};
