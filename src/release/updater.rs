//! Updater manifest (`latest.json`) generation.
//!
//! The Tauri updater reads a JSON document with the latest version, release
//! notes and, per `<os>-<arch>` key, a download URL and the minisign
//! signature of the updater bundle.

use crate::artifacts::Artifact;
use crate::error::{ErrorExt, Result};
use crate::metadata::{TargetInfo, TargetPlatform};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Asset name of the manifest.
pub const MANIFEST_NAME: &str = "latest.json";

/// Download URLs of draft releases point at a temporary `untagged-*` tag.
static UNTAGGED_DOWNLOAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/download/untagged-[^/]+/").expect("valid regex"));

/// Inputs for the manifest upload.
#[derive(Clone, Debug)]
pub struct UpdateManifestParams<'a> {
    /// Repository owner
    pub owner: &'a str,
    /// Repository name
    pub repo: &'a str,
    /// App version
    pub version: &'a str,
    /// Release notes
    pub notes: &'a str,
    /// Release tag, empty when uploading by id
    pub tag_name: &'a str,
    /// Release id
    pub release_id: u64,
    /// Release (or debug) artifacts
    pub artifacts: &'a [Artifact],
    /// Desktop target the artifacts were built for
    pub target: &'a TargetInfo,
    /// Installers are signed directly
    pub unzipped_sigs: bool,
    /// Prefer the NSIS installer over MSI for `windows-<arch>`
    pub prefer_nsis: bool,
    /// Keep a `darwin-universal` entry for universal macOS builds
    pub keep_universal: bool,
}

/// One platform entry.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PlatformEntry {
    /// Minisign signature contents
    pub signature: String,
    /// Download URL of the updater bundle
    pub url: String,
}

/// The manifest document.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct UpdateManifest {
    /// App version
    pub version: String,
    /// Release notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// RFC 3339 publication date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,
    /// Entries keyed by `<os>-<arch>` and `<os>-<arch>-<bundle>`
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformEntry>,
}

/// Installer kinds the updater can install.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpdaterBundle {
    /// macOS `.app` (always shipped as `.app.tar.gz`)
    App,
    /// Linux AppImage
    AppImage,
    /// Debian package (unzipped signatures only)
    Deb,
    /// RPM package (unzipped signatures only)
    Rpm,
    /// Windows MSI
    Msi,
    /// Windows NSIS setup
    Nsis,
}

impl UpdaterBundle {
    const ALL: [UpdaterBundle; 6] = [
        UpdaterBundle::App,
        UpdaterBundle::AppImage,
        UpdaterBundle::Deb,
        UpdaterBundle::Rpm,
        UpdaterBundle::Msi,
        UpdaterBundle::Nsis,
    ];

    /// Suffix of the signed updater file.
    fn updater_suffix(self, unzipped_sigs: bool) -> Option<&'static str> {
        match (self, unzipped_sigs) {
            (UpdaterBundle::App, _) => Some(".app.tar.gz"),
            (UpdaterBundle::AppImage, false) => Some(".AppImage.tar.gz"),
            (UpdaterBundle::AppImage, true) => Some(".AppImage"),
            (UpdaterBundle::Deb, true) => Some(".deb"),
            (UpdaterBundle::Rpm, true) => Some(".rpm"),
            (UpdaterBundle::Deb | UpdaterBundle::Rpm, false) => None,
            (UpdaterBundle::Msi, false) => Some(".msi.zip"),
            (UpdaterBundle::Msi, true) => Some(".msi"),
            (UpdaterBundle::Nsis, false) => Some(".nsis.zip"),
            (UpdaterBundle::Nsis, true) => Some(".exe"),
        }
    }

    /// Suffix used in installer-specific keys.
    fn key(self) -> &'static str {
        match self {
            UpdaterBundle::App => "app",
            UpdaterBundle::AppImage => "appimage",
            UpdaterBundle::Deb => "deb",
            UpdaterBundle::Rpm => "rpm",
            UpdaterBundle::Msi => "msi",
            UpdaterBundle::Nsis => "nsis",
        }
    }
}

/// A signed updater file found among the artifacts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignedBundle {
    /// Installer kind
    pub bundle: UpdaterBundle,
    /// Updater file uploaded as an asset
    pub artifact: Artifact,
    /// Its `.sig` file
    pub signature_path: PathBuf,
}

/// Updater files that have a `.sig` sibling.
pub fn signed_bundles(artifacts: &[Artifact], unzipped_sigs: bool) -> Vec<SignedBundle> {
    let mut found = Vec::new();
    for artifact in artifacts {
        let path = artifact.path.to_string_lossy();
        let Some(bundle) = UpdaterBundle::ALL.into_iter().find(|b| {
            b.updater_suffix(unzipped_sigs)
                .is_some_and(|suffix| path.ends_with(suffix))
        }) else {
            continue;
        };

        let signature_path = PathBuf::from(format!("{path}.sig"));
        let listed = artifacts.iter().any(|a| a.path == signature_path);
        if listed || signature_path.is_file() {
            found.push(SignedBundle {
                bundle,
                artifact: artifact.clone(),
                signature_path,
            });
        }
    }
    found
}

/// Release asset name of an artifact.
///
/// Spaces become dots. `.app.tar.gz` archives (and their signatures) are
/// suffixed with the architecture so macOS builds of different arches do not
/// overwrite each other.
pub fn asset_name(artifact: &Artifact) -> String {
    let file_name = artifact
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = file_name.trim().replace(' ', ".");

    for ext in [".app.tar.gz.sig", ".app.tar.gz"] {
        if let Some(stem) = name.strip_suffix(ext) {
            return format!("{stem}_{}{ext}", artifact.arch);
        }
    }
    name
}

/// Points draft download URLs at the final tag (or `latest` without a tag).
pub fn rewrite_download_url(url: &str, tag_name: &str) -> String {
    if tag_name.is_empty() {
        return UNTAGGED_DOWNLOAD
            .replace(url, "/latest/download/")
            .into_owned();
    }
    let encoded: String = url::form_urlencoded::byte_serialize(tag_name.as_bytes()).collect();
    UNTAGGED_DOWNLOAD
        .replace(url, format!("/download/{encoded}/").as_str())
        .into_owned()
}

/// Builds the manifest for this run, merged over `existing`.
///
/// `download_urls` maps asset names to their download URLs. Returns `None`
/// when no signed updater file was built.
pub fn build_manifest(
    params: &UpdateManifestParams<'_>,
    existing: Option<UpdateManifest>,
    download_urls: &HashMap<String, String>,
    pub_date: String,
) -> Result<Option<UpdateManifest>> {
    let signed = signed_bundles(params.artifacts, params.unzipped_sigs);
    if signed.is_empty() {
        log::warn!("Signature not found for the updater JSON. Skipping upload...");
        return Ok(None);
    }

    let mut platforms = existing
        .filter(|m| m.version == params.version)
        .map(|m| m.platforms)
        .unwrap_or_default();

    let os = params.target.platform.updater_os();
    let mut defaults: BTreeMap<String, (UpdaterBundle, PlatformEntry, bool)> = BTreeMap::new();

    for bundle in &signed {
        let signature = read_signature(&bundle.signature_path)?;
        let name = asset_name(&bundle.artifact);
        let url = match download_urls.get(&name) {
            Some(url) => rewrite_download_url(url, params.tag_name),
            None => {
                log::warn!("No uploaded asset named {}, skipping it in {}", name, MANIFEST_NAME);
                continue;
            }
        };
        let entry = PlatformEntry { signature, url };

        for (arch, fill_only) in updater_arches(params, &bundle.artifact.arch) {
            let key = format!("{os}-{arch}");
            let bundle_key = format!("{key}-{}", bundle.bundle.key());
            if !(fill_only && platforms.contains_key(&bundle_key)) {
                platforms.insert(bundle_key, entry.clone());
            }

            let replace = match defaults.get(&key) {
                None => true,
                Some((current, _, _)) => preferred(params, bundle.bundle, *current),
            };
            if replace {
                defaults.insert(key, (bundle.bundle, entry.clone(), fill_only));
            }
        }
    }

    for (key, (_, entry, fill_only)) in defaults {
        if fill_only && platforms.contains_key(&key) {
            continue;
        }
        platforms.insert(key, entry);
    }

    Ok(Some(UpdateManifest {
        version: params.version.to_string(),
        notes: Some(params.notes.to_string()).filter(|n| !n.is_empty()),
        pub_date: Some(pub_date),
        platforms,
    }))
}

/// Manifest arches an artifact is published under.
///
/// A universal macOS build only fills the `x86_64` and `aarch64` keys that no
/// arch-specific build has claimed.
fn updater_arches<'a>(params: &UpdateManifestParams<'_>, arch: &'a str) -> Vec<(&'a str, bool)> {
    if arch == "universal" && params.target.platform == TargetPlatform::MacOs {
        let mut arches = vec![("x86_64", true), ("aarch64", true)];
        if params.keep_universal {
            arches.push(("universal", false));
        }
        arches
    } else {
        vec![(arch, false)]
    }
}

/// Whether `candidate` should be the default entry over `current`.
fn preferred(params: &UpdateManifestParams<'_>, candidate: UpdaterBundle, current: UpdaterBundle) -> bool {
    let rank = |b: UpdaterBundle| match b {
        UpdaterBundle::Nsis if params.prefer_nsis => 0,
        UpdaterBundle::Msi => 1,
        UpdaterBundle::Nsis => 2,
        UpdaterBundle::App | UpdaterBundle::AppImage => 0,
        UpdaterBundle::Deb => 3,
        UpdaterBundle::Rpm => 4,
    };
    rank(candidate) < rank(current)
}

fn read_signature(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)
        .fs_context("reading updater signature", path)?
        .trim()
        .to_string())
}
