//! Tauri configuration files (`tauri.conf.json`, `Tauri.toml`).
//!
//! Only the handful of fields the release flow needs are extracted. Both the
//! v1 layout (`package.productName`, `tauri.bundle`) and the v2 layout
//! (top-level `productName`, `identifier`, `bundle`) are understood.

use crate::error::{ActionError, ErrorExt, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Config file names, in lookup order.
pub const CONFIG_FILES: [&str; 2] = ["tauri.conf.json", "Tauri.toml"];

/// Parsed Tauri configuration.
#[derive(Clone, Debug)]
pub struct TauriConfig {
    raw: Value,
}

impl TauriConfig {
    /// Wraps an already-parsed config value.
    pub fn from_value(raw: Value) -> Self {
        Self { raw }
    }

    /// Reads the base config file from a Tauri project directory.
    pub fn from_base_config(tauri_dir: &Path) -> Result<Self> {
        let path = config_path(tauri_dir).ok_or_else(|| {
            ActionError::ConfigDetection(format!(
                "no {} in {}",
                CONFIG_FILES.join(" or "),
                tauri_dir.display()
            ))
        })?;
        Self::from_file(&path)
    }

    /// Reads a config file, JSON or TOML depending on its extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).fs_context("reading Tauri config", path)?;
        let raw = if path.extension().and_then(|e| e.to_str()) == Some("toml") {
            let value: toml::Value = toml::from_str(&contents)?;
            serde_json::to_value(value)?
        } else {
            serde_json::from_str(&contents)?
        };
        Ok(Self { raw })
    }

    /// Applies a `--config` override on top of this config.
    ///
    /// The override is either inline JSON or a path to a JSON/TOML file.
    /// Relative paths resolve against `base_dir`, the directory the build
    /// tool runs in. Objects are merged as a JSON merge patch.
    pub fn with_override(mut self, config_arg: &str, base_dir: &Path) -> Result<Self> {
        let trimmed = config_arg.trim();
        let patch = if trimmed.starts_with('{') {
            serde_json::from_str(trimmed)?
        } else {
            let path = base_dir.join(trimmed);
            Self::from_file(&path)?.raw
        };
        merge_patch(&mut self.raw, patch);
        Ok(self)
    }

    /// Whether this is a Tauri v2 config.
    pub fn is_v2(&self) -> bool {
        let schema_v2 = self
            .raw
            .get("$schema")
            .and_then(Value::as_str)
            .is_some_and(|s| s.contains("config/2"));
        schema_v2
            || self.raw.get("identifier").is_some()
            || self.raw.get("app").is_some()
            || (self.raw.get("tauri").is_none() && self.raw.get("bundle").is_some())
    }

    /// Product name.
    pub fn product_name(&self) -> Option<String> {
        self.str_at(&["productName"])
            .or_else(|| self.str_at(&["package", "productName"]))
    }

    /// Version string. May be a path to a `package.json`.
    pub fn version(&self) -> Option<String> {
        self.str_at(&["version"])
            .or_else(|| self.str_at(&["package", "version"]))
    }

    /// Bundle section for either layout.
    fn bundle(&self) -> Option<&Value> {
        self.raw
            .get("bundle")
            .or_else(|| self.raw.get("tauri").and_then(|t| t.get("bundle")))
    }

    /// Whether the updater signs the installers directly instead of zip/tar.gz archives.
    pub fn unzipped_sigs(&self) -> bool {
        self.is_v2()
            && self
                .bundle()
                .and_then(|b| b.get("createUpdaterArtifacts"))
                .and_then(Value::as_bool)
                .unwrap_or(false)
    }

    /// WiX languages the MSI installer is built for.
    pub fn wix_languages(&self) -> Vec<String> {
        let language = self
            .bundle()
            .and_then(|b| b.get("windows"))
            .and_then(|w| w.get("wix"))
            .and_then(|w| w.get("language"));

        match language {
            Some(Value::String(lang)) => vec![lang.clone()],
            Some(Value::Array(langs)) => langs
                .iter()
                .filter_map(|l| l.as_str().map(String::from))
                .collect(),
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            _ => vec!["en-US".to_string()],
        }
    }

    /// RPM release number used in the package file name.
    pub fn rpm_release(&self) -> String {
        self.bundle()
            .and_then(|b| b.get("linux"))
            .and_then(|l| l.get("rpm"))
            .and_then(|r| r.get("release"))
            .and_then(Value::as_str)
            .unwrap_or("1")
            .to_string()
    }

    fn str_at(&self, path: &[&str]) -> Option<String> {
        let mut value = &self.raw;
        for key in path {
            value = value.get(key)?;
        }
        value.as_str().map(String::from)
    }
}

/// First config file present in `tauri_dir`.
pub fn config_path(tauri_dir: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| tauri_dir.join(name))
        .find(|p| p.is_file())
}

/// RFC 7396 JSON merge patch.
fn merge_patch(target: &mut Value, patch: Value) {
    match patch {
        Value::Object(patch_map) => {
            if !target.is_object() {
                *target = Value::Object(serde_json::Map::new());
            }
            if let Value::Object(target_map) = target {
                for (key, value) in patch_map {
                    if value.is_null() {
                        target_map.remove(&key);
                    } else {
                        merge_patch(target_map.entry(key).or_insert(Value::Null), value);
                    }
                }
            }
        }
        other => *target = other,
    }
}
