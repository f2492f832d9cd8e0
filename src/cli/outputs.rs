//! Step outputs for later workflow steps.

use crate::builder::RunOutcome;
use crate::error::{ErrorExt, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Name/value pairs published after a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActionOutputs {
    entries: Vec<(&'static str, String)>,
}

impl ActionOutputs {
    /// Outputs of a finished run.
    ///
    /// Release outputs are only present when the release was resolved by tag.
    pub fn from_outcome(outcome: &RunOutcome) -> Result<Self> {
        let mut outputs = Self::default();
        if outcome.artifacts.is_empty() {
            return Ok(outputs);
        }

        let paths: Vec<String> = outcome
            .artifacts
            .iter()
            .map(|a| a.path.display().to_string())
            .collect();
        outputs.push("artifactPaths", serde_json::to_string(&paths)?);
        outputs.push("appVersion", outcome.version.clone());

        if let Some(release) = &outcome.release {
            outputs.push("releaseUploadUrl", release.upload_url.clone());
            outputs.push("releaseId", release.id.to_string());
            outputs.push("releaseHtmlUrl", release.html_url.clone());
        }
        Ok(outputs)
    }

    fn push(&mut self, name: &'static str, value: String) {
        self.entries.push((name, value));
    }

    /// Value of an output, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether no output is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `name=value` lines to the outputs file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .fs_context("opening outputs file", path)?;
        for (name, value) in &self.entries {
            log::info!("Output {}={}", name, value);
            writeln!(file, "{name}={value}").fs_context("writing outputs file", path)?;
        }
        Ok(())
    }

    /// Writes to the file named by `GITHUB_OUTPUT`, or only logs when unset.
    pub fn publish(&self) -> Result<()> {
        match std::env::var_os("GITHUB_OUTPUT").filter(|v| !v.is_empty()) {
            Some(path) => self.write_to(Path::new(&path)),
            None => {
                for (name, value) in &self.entries {
                    log::info!("Output {}={}", name, value);
                }
                Ok(())
            }
        }
    }
}
