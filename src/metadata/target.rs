//! Target platform and architecture of the desktop build.

use std::fmt;

/// Operating system the bundles are built for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TargetPlatform {
    /// macOS (`*-apple-darwin`)
    MacOs,
    /// Windows (`*-pc-windows-*`)
    Windows,
    /// Linux and other unix-likes
    Linux,
    /// Android (mobile builds)
    Android,
    /// iOS (mobile builds)
    Ios,
}

impl TargetPlatform {
    /// OS segment used in updater manifest keys.
    pub fn updater_os(self) -> &'static str {
        match self {
            TargetPlatform::MacOs => "darwin",
            TargetPlatform::Windows => "windows",
            TargetPlatform::Linux => "linux",
            TargetPlatform::Android => "android",
            TargetPlatform::Ios => "ios",
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetPlatform::MacOs => "macos",
            TargetPlatform::Windows => "windows",
            TargetPlatform::Linux => "linux",
            TargetPlatform::Android => "android",
            TargetPlatform::Ios => "ios",
        };
        f.write_str(name)
    }
}

/// Platform and architecture the artifacts belong to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TargetInfo {
    /// Target OS
    pub platform: TargetPlatform,
    /// Architecture name (`x86_64`, `aarch64`, `i686`, `armv7`, `universal`, `mobile`)
    pub arch: String,
    /// Target triple passed with `--target`, if any
    pub triple: Option<String>,
}

impl TargetInfo {
    /// Target of the current host.
    pub fn host() -> Self {
        let platform = match std::env::consts::OS {
            "macos" => TargetPlatform::MacOs,
            "windows" => TargetPlatform::Windows,
            _ => TargetPlatform::Linux,
        };
        let arch = match std::env::consts::ARCH {
            "x86" => "i686",
            "arm" => "armv7",
            other => other,
        };
        Self {
            platform,
            arch: arch.to_string(),
            triple: None,
        }
    }

    /// Target described by an optional `--target` triple, falling back to the host.
    pub fn from_triple(triple: Option<&str>) -> Self {
        let Some(triple) = triple.filter(|t| !t.is_empty()) else {
            return Self::host();
        };
        let host = Self::host();

        let platform = if triple.contains("windows") {
            TargetPlatform::Windows
        } else if triple.contains("darwin") || triple.contains("apple") {
            TargetPlatform::MacOs
        } else if triple.contains("linux") {
            TargetPlatform::Linux
        } else {
            host.platform
        };

        let arch = if triple.starts_with("universal") {
            "universal".to_string()
        } else if triple.starts_with("x86_64") {
            "x86_64".to_string()
        } else if triple.starts_with("aarch64") {
            "aarch64".to_string()
        } else if triple.starts_with("armv7") {
            "armv7".to_string()
        } else if triple.starts_with("i686") || triple.starts_with("i586") {
            "i686".to_string()
        } else {
            host.arch
        };

        Self {
            platform,
            arch,
            triple: Some(triple.to_string()),
        }
    }

    /// Mobile targets carry the `mobile` architecture tag.
    pub fn mobile(platform: TargetPlatform) -> Self {
        Self {
            platform,
            arch: "mobile".to_string(),
            triple: None,
        }
    }
}
