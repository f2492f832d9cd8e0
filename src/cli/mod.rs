//! Command line interface for the Tauri bundler.
//!
//! Parses arguments, runs the orchestrator against GitHub, and publishes the
//! step outputs.

mod args;
mod output;
mod outputs;

pub use args::{Args, RuntimeConfig, flag_value};
pub use output::OutputManager;
pub use outputs::ActionOutputs;

use crate::builder::Orchestrator;
use crate::error::Result;
use crate::release::GitHubClient;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute(&args).await
}

/// Runs a full build-and-release for parsed arguments.
pub async fn execute(args: &Args) -> Result<i32> {
    let config = RuntimeConfig::from(args);
    let build = args.build_options()?;
    let release = args.release_options()?;

    config.section("Tauri build")?;
    config.progress(&format!("Project: {}", build.project_path.display()))?;
    config.verbose_println(&format!("Build arguments: {:?}", build.args))?;

    let client = GitHubClient::new(&args.github_api_url, args.github_token.clone())?;
    let outcome = Orchestrator::new(client, build, release).run().await?;
    config.info(&format!("App version: {}", outcome.version))?;

    if outcome.artifacts.is_empty() {
        config.warn("No artifacts were found")?;
    } else {
        config.section("Artifacts")?;
        for artifact in &outcome.artifacts {
            config.indent(&artifact.path.display().to_string())?;
        }
    }

    ActionOutputs::from_outcome(&outcome)?.publish()?;

    match (&outcome.release, outcome.uploaded) {
        (Some(release), true) => config.success(&format!("Uploaded to {}", release.html_url))?,
        (None, true) => config.success("Uploaded release assets")?,
        _ => config.success(&format!(
            "Built {} artifact(s) for version {}",
            outcome.artifacts.len(),
            outcome.version
        ))?,
    }

    Ok(0)
}
