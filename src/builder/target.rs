//! Build targets and platform selection.
//!
//! A run builds exactly one platform family. [`select_platform`] picks it from
//! the host OS and the requested mobile mode, and [`build_targets`] expands it
//! into the ordered `(platform, variant)` pairs the orchestrator dispatches on.

use std::fmt;

/// Platform family built by a single run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Platform {
    /// Desktop bundles for the host (or `--target`) OS
    Desktop,
    /// Android apk/aab outputs
    Android,
    /// iOS ipa outputs
    Ios,
}

impl Platform {
    /// Sub-command passed to the Tauri CLI before `build`, if any.
    pub fn cli_verb(self) -> Option<&'static str> {
        match self {
            Platform::Desktop => None,
            Platform::Android => Some("android"),
            Platform::Ios => Some("ios"),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Desktop => "desktop",
            Platform::Android => "android",
            Platform::Ios => "ios",
        };
        f.write_str(name)
    }
}

/// Build profile.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Variant {
    /// Optimized release build
    Release,
    /// Debug build (`--debug`)
    Debug,
}

impl Variant {
    /// Whether `--debug` must be passed.
    pub fn is_debug(self) -> bool {
        matches!(self, Variant::Debug)
    }

    /// Output directory name used by cargo and the mobile toolchains.
    pub fn dir_name(self) -> &'static str {
        match self {
            Variant::Release => "release",
            Variant::Debug => "debug",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A single `(platform, variant)` build.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct BuildTarget {
    /// Platform family
    pub platform: Platform,
    /// Build profile
    pub variant: Variant,
}

impl BuildTarget {
    /// Creates a build target.
    pub fn new(platform: Platform, variant: Variant) -> Self {
        Self { platform, variant }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.platform, self.variant)
    }
}

/// Host operating system family.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HostOs {
    /// Linux hosts
    Linux,
    /// macOS hosts
    MacOs,
    /// Windows hosts
    Windows,
    /// Anything else
    Other,
}

impl HostOs {
    /// Host OS of the running process.
    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Maps a `std::env::consts::OS` value.
    pub fn from_os_name(os: &str) -> Self {
        match os {
            "linux" => HostOs::Linux,
            "macos" => HostOs::MacOs,
            "windows" => HostOs::Windows,
            _ => HostOs::Other,
        }
    }
}

/// Requested mobile mode.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MobileMode {
    /// Desktop build
    #[default]
    None,
    /// Whatever mobile platform the host supports
    All,
    /// Android only
    Android,
    /// iOS only
    Ios,
}

impl MobileMode {
    /// Parses the `mobile` input. Unknown values mean desktop.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "true" | "all" => MobileMode::All,
            "android" => MobileMode::Android,
            "ios" => MobileMode::Ios,
            "" | "false" => MobileMode::None,
            other => {
                log::warn!("Unknown mobile mode '{}', building desktop", other);
                MobileMode::None
            }
        }
    }
}

/// Picks the platform family for this run.
///
/// Android runs for `mobile: android` on any host and for `mobile: all` on
/// Linux hosts. iOS needs a macOS host. Desktop runs when neither applies.
pub fn select_platform(host: HostOs, mobile: MobileMode) -> Platform {
    let android = (host == HostOs::Linux && mobile == MobileMode::All)
        || mobile == MobileMode::Android;
    let ios = host == HostOs::MacOs && matches!(mobile, MobileMode::All | MobileMode::Ios);

    if android {
        Platform::Android
    } else if ios {
        Platform::Ios
    } else {
        Platform::Desktop
    }
}

/// Expands a platform into its enabled variants, release first.
pub fn build_targets(platform: Platform, include_release: bool, include_debug: bool) -> Vec<BuildTarget> {
    [(Variant::Release, include_release), (Variant::Debug, include_debug)]
        .into_iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(variant, _)| BuildTarget::new(platform, variant))
        .collect()
}
