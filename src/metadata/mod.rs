//! Project metadata discovery from the Tauri config, Cargo.toml and package.json.

pub mod config;
pub mod target;

pub use config::TauriConfig;
pub use target::{TargetInfo, TargetPlatform};

use crate::bail;
use crate::error::{ActionError, ErrorExt, Result};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories never searched for a Tauri project.
const IGNORED_DIRS: [&str; 4] = ["node_modules", ".git", "target", "dist"];

/// Resolved application metadata, derived once per run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectInfo {
    /// Product name used in bundle file names
    pub name: String,

    /// App version, substituted for `__VERSION__`
    pub version: String,

    /// Directory containing the Tauri config (usually `src-tauri`)
    pub tauri_path: PathBuf,

    /// Updater signs installers directly instead of zip/tar.gz archives
    pub unzipped_sigs: bool,

    /// WiX languages for MSI file names
    pub wix_languages: Vec<String>,

    /// RPM release number for RPM file names
    pub rpm_release: String,
}

/// Loads project metadata for the app under `root`.
///
/// `config_arg` is the value of a `-c/--config` pass-through flag.
///
/// ## Resolution order
/// - name: Tauri `productName` → `Cargo.toml` `[package].name` → `package.json` `name`
/// - version: Tauri `version` (a `*.json` value is read as a package.json) →
///   `Cargo.toml` version (workspace-inherited versions included) → `package.json` `version`
pub fn load_project_info(root: &Path, config_arg: Option<&str>) -> Result<ProjectInfo> {
    let tauri_path = find_tauri_dir(root).ok_or_else(|| ActionError::MissingProjectPath {
        root: root.to_path_buf(),
    })?;

    let mut config = TauriConfig::from_base_config(&tauri_path)?;
    if let Some(arg) = config_arg {
        config = config.with_override(arg, root)?;
    }

    let cargo = read_toml(&tauri_path.join("Cargo.toml"));
    let package_json = read_package_json(root);

    let name = config
        .product_name()
        .or_else(|| cargo_package_str(cargo.as_ref(), "name"))
        .or_else(|| json_str(package_json.as_ref(), "name"));
    let Some(name) = name else {
        bail!(
            "Could not determine the app name for {}. Set productName in the Tauri config.",
            tauri_path.display()
        );
    };

    let version = match config.version() {
        Some(v) if v.ends_with(".json") => {
            let path = tauri_path.join(&v);
            let contents = std::fs::read_to_string(&path).fs_context("reading version file", &path)?;
            let value: serde_json::Value = serde_json::from_str(&contents)?;
            json_str(Some(&value), "version")
        }
        Some(v) => Some(v),
        None => None,
    }
    .or_else(|| cargo_version(&tauri_path, cargo.as_ref()))
    .or_else(|| json_str(package_json.as_ref(), "version"));
    let Some(version) = version else {
        bail!(
            "Could not determine the app version for {}. Set version in the Tauri config.",
            tauri_path.display()
        );
    };

    if semver::Version::parse(&version).is_err() {
        log::warn!("App version '{}' is not valid semver", version);
    }

    Ok(ProjectInfo {
        name,
        version,
        unzipped_sigs: config.unzipped_sigs(),
        wix_languages: config.wix_languages(),
        rpm_release: config.rpm_release(),
        tauri_path,
    })
}

/// Finds the directory holding the Tauri config.
///
/// Checks `root` and `root/src-tauri` first, then searches below `root`
/// skipping dependency and build output directories.
pub fn find_tauri_dir(root: &Path) -> Option<PathBuf> {
    for candidate in [root.to_path_buf(), root.join("src-tauri")] {
        if config::config_path(&candidate).is_some() {
            return Some(candidate);
        }
    }

    WalkDir::new(root)
        .max_depth(4)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored(e))
        .filter_map(|e| e.ok())
        .find(|e| {
            e.file_type().is_file()
                && config::CONFIG_FILES.contains(&e.file_name().to_string_lossy().as_ref())
        })
        .and_then(|e| e.path().parent().map(Path::to_path_buf))
}

fn is_ignored(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && IGNORED_DIRS.contains(&entry.file_name().to_string_lossy().as_ref())
}

/// Reads `package.json` in `root`, if present and valid.
pub fn read_package_json(root: &Path) -> Option<serde_json::Value> {
    let contents = std::fs::read_to_string(root.join("package.json")).ok()?;
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring invalid package.json in {}: {}", root.display(), e);
            None
        }
    }
}

/// Whether `package.json` in `root` declares `dependency` directly.
pub fn has_dependency(dependency: &str, root: &Path) -> bool {
    let Some(package_json) = read_package_json(root) else {
        return false;
    };
    ["dependencies", "devDependencies"].iter().any(|section| {
        package_json
            .get(section)
            .and_then(|deps| deps.get(dependency))
            .is_some()
    })
}

fn read_toml(path: &Path) -> Option<toml::Value> {
    let contents = std::fs::read_to_string(path).ok()?;
    toml::from_str(&contents)
        .map_err(|e| log::warn!("Ignoring unparsable {}: {}", path.display(), e))
        .ok()
}

fn json_str(value: Option<&serde_json::Value>, key: &str) -> Option<String> {
    value?.get(key)?.as_str().map(String::from)
}

fn cargo_package_str(cargo: Option<&toml::Value>, key: &str) -> Option<String> {
    cargo?.get("package")?.get(key)?.as_str().map(String::from)
}

/// `[package].version`, following `version.workspace = true` to the workspace root.
fn cargo_version(tauri_path: &Path, cargo: Option<&toml::Value>) -> Option<String> {
    let version = cargo?.get("package")?.get("version")?;
    if let Some(v) = version.as_str() {
        return Some(v.to_string());
    }

    let inherits = version
        .get("workspace")
        .and_then(|w| w.as_bool())
        .unwrap_or(false);
    if !inherits {
        return None;
    }

    tauri_path.ancestors().skip(1).find_map(|dir| {
        read_toml(&dir.join("Cargo.toml"))?
            .get("workspace")?
            .get("package")?
            .get("version")?
            .as_str()
            .map(String::from)
    })
}
