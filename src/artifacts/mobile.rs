//! Android and iOS output locations.
//!
//! Paths mirror what the Gradle and Xcode projects generated by `tauri android
//! init` / `tauri ios init` write. Apk folders are lowercase
//! (`apk/arm64/release`), aab folders are camelCase (`bundle/arm64Release`).

use std::path::{Path, PathBuf};

/// Android ABI buckets, universal first.
pub const ANDROID_ARCHES: [&str; 5] = ["universal", "arm64", "arm", "x86_64", "x86"];

/// Architectures Xcode builds the iOS app for.
pub const IOS_ARCHES: [&str; 3] = ["arm64", "arm64-sim", "x86_64"];

/// Android packaging outputs, in reporting order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AndroidOutput {
    UnsignedReleaseApk,
    SignedReleaseApk,
    ReleaseAab,
    DebugApk,
    DebugAab,
}

impl AndroidOutput {
    const ALL: [AndroidOutput; 5] = [
        AndroidOutput::UnsignedReleaseApk,
        AndroidOutput::SignedReleaseApk,
        AndroidOutput::ReleaseAab,
        AndroidOutput::DebugApk,
        AndroidOutput::DebugAab,
    ];

    /// Path of this output for `arch`, relative to `gen/android/app/build/outputs`.
    fn relative_path(self, arch: &str) -> PathBuf {
        match self {
            AndroidOutput::UnsignedReleaseApk => {
                Path::new("apk").join(arch).join("release").join(format!("app-{arch}-release-unsigned.apk"))
            }
            AndroidOutput::SignedReleaseApk => {
                Path::new("apk").join(arch).join("release").join(format!("app-{arch}-release.apk"))
            }
            AndroidOutput::ReleaseAab => Path::new("bundle")
                .join(format!("{arch}Release"))
                .join(format!("app-{arch}-release.aab")),
            AndroidOutput::DebugApk => {
                Path::new("apk").join(arch).join("debug").join(format!("app-{arch}-debug.apk"))
            }
            AndroidOutput::DebugAab => Path::new("bundle")
                .join(format!("{arch}Debug"))
                .join(format!("app-{arch}-debug.aab")),
        }
    }
}

/// Root of the Gradle outputs.
pub fn android_output_dir(tauri_path: &Path) -> PathBuf {
    tauri_path.join("gen/android/app/build/outputs")
}

/// Root of the Xcode build outputs.
pub fn ios_output_dir(tauri_path: &Path) -> PathBuf {
    tauri_path.join("gen/apple/app/build")
}

/// All 25 Android candidates: every output kind for every ABI bucket.
///
/// Debug and release outputs are both listed regardless of the variant built;
/// whichever exist are picked up.
pub fn android_candidates(tauri_path: &Path) -> Vec<PathBuf> {
    let root = android_output_dir(tauri_path);
    AndroidOutput::ALL
        .iter()
        .flat_map(|output| {
            ANDROID_ARCHES
                .iter()
                .map(|arch| root.join(output.relative_path(arch)))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// The 3 iOS candidates, `<arch>/<app name>.ipa`.
///
/// Assumes Xcode names the ipa after the product name.
pub fn ios_candidates(tauri_path: &Path, app_name: &str) -> Vec<PathBuf> {
    let root = ios_output_dir(tauri_path);
    IOS_ARCHES
        .iter()
        .map(|arch| root.join(arch).join(format!("{app_name}.ipa")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn android_has_25_distinct_candidates() {
        let candidates = android_candidates(Path::new("/app/src-tauri"));
        assert_eq!(candidates.len(), 25);
        assert_eq!(candidates.iter().collect::<HashSet<_>>().len(), 25);
        assert_eq!(
            candidates[0],
            PathBuf::from("/app/src-tauri/gen/android/app/build/outputs/apk/universal/release/app-universal-release-unsigned.apk")
        );
    }

    #[test]
    fn aab_folders_are_camel_case() {
        let candidates = android_candidates(Path::new("/p"));
        let root = android_output_dir(Path::new("/p"));
        assert!(candidates.contains(&root.join("bundle/x86_64Release/app-x86_64-release.aab")));
        assert!(candidates.contains(&root.join("bundle/armDebug/app-arm-debug.aab")));
        assert!(candidates.contains(&root.join("apk/arm64/debug/app-arm64-debug.apk")));
        assert!(candidates.contains(&root.join("apk/x86/release/app-x86-release.apk")));
        assert!(!candidates.iter().any(|p| p.to_string_lossy().contains("apk/arm64Release")));
    }

    #[test]
    fn ios_candidates_use_app_name() {
        let candidates = ios_candidates(Path::new("/p"), "My App");
        let root = ios_output_dir(Path::new("/p"));
        assert_eq!(
            candidates,
            vec![
                root.join("arm64/My App.ipa"),
                root.join("arm64-sim/My App.ipa"),
                root.join("x86_64/My App.ipa"),
            ]
        );
    }
}
