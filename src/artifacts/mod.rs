//! Artifact discovery after a build.
//!
//! [`locate`] turns a [`BuildTarget`] and the project metadata into the list
//! of output paths the build tool may have produced, logs them, and keeps the
//! ones that exist on disk. An empty result is not an error here; the
//! orchestrator decides what it means.

pub mod archive;
pub mod desktop;
pub mod mobile;

use crate::builder::{BuildTarget, Platform};
use crate::metadata::{ProjectInfo, TargetInfo};
use std::path::{Path, PathBuf};

/// A file produced by the build.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Artifact {
    /// Absolute file path
    pub path: PathBuf,
    /// Architecture tag (`x86_64`, `aarch64`, `universal`, `mobile`, ...)
    pub arch: String,
}

impl Artifact {
    /// Creates an artifact.
    pub fn new(path: impl Into<PathBuf>, arch: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            arch: arch.into(),
        }
    }
}

/// Where desktop bundles are written.
#[derive(Clone, Debug, Default)]
pub struct LocateOptions {
    /// `CARGO_TARGET_DIR`, if set
    pub cargo_target_dir: Option<PathBuf>,
    /// Desktop target (`--target` or host)
    pub target: Option<TargetInfo>,
}

/// Existing artifacts for one build.
pub fn locate(build: BuildTarget, info: &ProjectInfo, options: &LocateOptions) -> Vec<Artifact> {
    let candidates = candidates(build, info, options);

    log::info!(
        "Looking for artifacts in:\n{}",
        candidates
            .iter()
            .map(|a| a.path.display().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    );

    candidates.into_iter().filter(|a| exists(&a.path)).collect()
}

/// Every path the build may have produced, existing or not.
pub fn candidates(build: BuildTarget, info: &ProjectInfo, options: &LocateOptions) -> Vec<Artifact> {
    match build.platform {
        Platform::Android => tag(mobile::android_candidates(&info.tauri_path), "mobile"),
        Platform::Ios => tag(mobile::ios_candidates(&info.tauri_path, &info.name), "mobile"),
        Platform::Desktop => {
            let target = options.target.clone().unwrap_or_else(TargetInfo::host);
            let target_dir = desktop::target_dir(&info.tauri_path, options.cargo_target_dir.as_deref());
            let dir = desktop::artifacts_dir(&target_dir, &target, build.variant);
            tag(desktop::desktop_candidates(&dir, info, &target), &target.arch)
        }
    }
}

fn tag(paths: Vec<PathBuf>, arch: &str) -> Vec<Artifact> {
    paths.into_iter().map(|p| Artifact::new(p, arch)).collect()
}

fn exists(path: &Path) -> bool {
    std::fs::metadata(path).is_ok()
}
