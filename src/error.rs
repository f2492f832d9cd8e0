//! Error types for build and release operations.
//!
//! Fatal conditions bubble up to `main` and end the run with exit code 1.
//! Non-fatal conditions (config detection) are logged and replaced by defaults.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for build and release operations
pub type Result<T> = std::result::Result<T, ActionError>;

/// Main error type for all build and release operations
#[derive(Error, Debug)]
pub enum ActionError {
    /// The build tool (or another external process) failed after exhausting retries
    #[error("Command `{command}` failed: {}", describe_exit(.exit_code, .reason))]
    ProcessFailure {
        /// Command line that was executed
        command: String,
        /// Exit code, `None` when the process could not be spawned or was killed by a signal
        exit_code: Option<i32>,
        /// Short failure reason
        reason: String,
    },

    /// Reading the Tauri config for version detection failed
    #[error("Could not detect Tauri config: {0}")]
    ConfigDetection(String),

    /// A release or tag was requested but the build produced nothing to upload
    #[error("No artifacts were found.")]
    NoArtifactsFound,

    /// The Tauri project directory could not be located
    #[error("Couldn't detect path of tauri app under {}", .root.display())]
    MissingProjectPath {
        /// Root that was searched
        root: PathBuf,
    },

    /// Release API returned an unexpected response
    #[error("Release error: {0}")]
    Release(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

fn describe_exit(exit_code: &Option<i32>, reason: &str) -> String {
    match exit_code {
        Some(code) => format!("exit code {code} ({reason})"),
        None => reason.to_string(),
    }
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },
}

impl ActionError {
    /// Spawn failures carry no exit code.
    pub fn spawn_error(command: impl Into<String>, err: &std::io::Error) -> Self {
        Self::ProcessFailure {
            command: command.into(),
            exit_code: None,
            reason: format!("spawn-error: {err}"),
        }
    }

    /// Whether this error is a failed external process.
    pub fn is_process_failure(&self) -> bool {
        matches!(self, Self::ProcessFailure { .. })
    }
}

/// Attach the failing path to IO errors.
pub trait ErrorExt<T> {
    /// Wrap an IO error with a description of the operation and the path involved.
    fn fs_context(self, action: &str, path: &Path) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, action: &str, path: &Path) -> Result<T> {
        self.map_err(|e| {
            ActionError::Io(std::io::Error::new(
                e.kind(),
                format!("{action} {}: {e}", path.display()),
            ))
        })
    }
}

/// Return early with an [`ActionError::Anyhow`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::error::ActionError::Anyhow(anyhow::anyhow!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_failure_reports_exit_code() {
        let err = ActionError::ProcessFailure {
            command: "yarn tauri build".into(),
            exit_code: Some(101),
            reason: "non-zero exit".into(),
        };
        assert_eq!(
            err.to_string(),
            "Command `yarn tauri build` failed: exit code 101 (non-zero exit)"
        );
        assert!(err.is_process_failure());
    }

    #[test]
    fn spawn_error_has_no_exit_code() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ActionError::spawn_error("missing-bin build", &io);
        match &err {
            ActionError::ProcessFailure { exit_code, reason, .. } => {
                assert!(exit_code.is_none());
                assert!(reason.starts_with("spawn-error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn fs_context_keeps_kind_and_path() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = res
            .fs_context("reading config", Path::new("/tmp/tauri.conf.json"))
            .unwrap_err();
        match err {
            ActionError::Io(io) => {
                assert_eq!(io.kind(), std::io::ErrorKind::PermissionDenied);
                assert!(io.to_string().contains("/tmp/tauri.conf.json"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
