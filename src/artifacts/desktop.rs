//! Desktop bundle locations under the cargo target directory.

use crate::builder::Variant;
use crate::metadata::{ProjectInfo, TargetInfo, TargetPlatform};
use std::path::{Path, PathBuf};

/// Cargo target directory for the Tauri crate.
///
/// Order: `CARGO_TARGET_DIR` (passed in by the caller), `build.target-dir` in
/// `.cargo/config.toml`, the enclosing Cargo workspace, then `<tauri>/target`.
pub fn target_dir(tauri_path: &Path, cargo_target_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = cargo_target_dir {
        return absolute_from(tauri_path, dir);
    }

    for dir in tauri_path.ancestors() {
        for name in ["config.toml", "config"] {
            let config = dir.join(".cargo").join(name);
            if let Some(target) = read_target_dir(&config) {
                return absolute_from(dir, &target);
            }
        }
    }

    tauri_path
        .ancestors()
        .skip(1)
        .find(|dir| is_workspace_root(dir))
        .unwrap_or(tauri_path)
        .join("target")
}

fn absolute_from(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn read_target_dir(config: &Path) -> Option<PathBuf> {
    let contents = std::fs::read_to_string(config).ok()?;
    let value: toml::Value = toml::from_str(&contents).ok()?;
    value
        .get("build")?
        .get("target-dir")?
        .as_str()
        .map(PathBuf::from)
}

fn is_workspace_root(dir: &Path) -> bool {
    std::fs::read_to_string(dir.join("Cargo.toml"))
        .ok()
        .and_then(|c| toml::from_str::<toml::Value>(&c).ok())
        .is_some_and(|v| v.get("workspace").is_some())
}

/// Directory containing `bundle/` for a build.
pub fn artifacts_dir(target_dir: &Path, target: &TargetInfo, variant: Variant) -> PathBuf {
    let mut dir = target_dir.to_path_buf();
    if let Some(triple) = &target.triple {
        dir.push(triple);
    }
    dir.push(variant.dir_name());
    dir
}

/// Candidate bundle paths for the desktop target.
pub fn desktop_candidates(
    artifacts_dir: &Path,
    info: &ProjectInfo,
    target: &TargetInfo,
) -> Vec<PathBuf> {
    let bundle = artifacts_dir.join("bundle");
    let name = &info.name;
    let version = &info.version;
    let arch = target.arch.as_str();

    match target.platform {
        TargetPlatform::MacOs => {
            let dmg_arch = match arch {
                "x86_64" => "x64",
                other => other,
            };
            let app = bundle.join("macos").join(format!("{name}.app"));
            vec![
                bundle.join("dmg").join(format!("{name}_{version}_{dmg_arch}.dmg")),
                app.clone(),
                with_suffix(&app, ".tar.gz"),
                with_suffix(&app, ".tar.gz.sig"),
            ]
        }
        TargetPlatform::Windows => {
            let win_arch = match arch {
                "x86_64" => "x64",
                "i686" => "x86",
                "aarch64" => "arm64",
                other => other,
            };
            let mut paths = Vec::new();
            for lang in &info.wix_languages {
                let msi = bundle
                    .join("msi")
                    .join(format!("{name}_{version}_{win_arch}_{lang}.msi"));
                let archive = with_suffix(&msi, ".zip");
                paths.extend(signed_forms(&msi, archive, info.unzipped_sigs));
            }
            let nsis_dir = bundle.join("nsis");
            let setup = format!("{name}_{version}_{win_arch}-setup");
            let nsis = nsis_dir.join(format!("{setup}.exe"));
            let archive = nsis_dir.join(format!("{setup}.nsis.zip"));
            paths.extend(signed_forms(&nsis, archive, info.unzipped_sigs));
            paths
        }
        TargetPlatform::Linux | TargetPlatform::Android | TargetPlatform::Ios => {
            let (deb_arch, rpm_arch, appimage_arch) = match arch {
                "x86_64" => ("amd64", "x86_64", "amd64"),
                "i686" => ("i386", "i386", "i386"),
                "aarch64" => ("arm64", "aarch64", "aarch64"),
                "armv7" => ("armhf", "armhfp", "armhf"),
                other => (other, other, other),
            };
            let release = &info.rpm_release;
            let mut paths = vec![
                bundle.join("deb").join(format!("{name}_{version}_{deb_arch}.deb")),
                bundle
                    .join("rpm")
                    .join(format!("{name}-{version}-{release}.{rpm_arch}.rpm")),
            ];
            if info.unzipped_sigs {
                paths.push(with_suffix(&paths[0], ".sig"));
                paths.push(with_suffix(&paths[1], ".sig"));
            }
            let appimage = bundle
                .join("appimage")
                .join(format!("{name}_{version}_{appimage_arch}.AppImage"));
            let archive = with_suffix(&appimage, ".tar.gz");
            paths.extend(signed_forms(&appimage, archive, info.unzipped_sigs));
            paths
        }
    }
}

/// An installer plus its updater archive and signature.
///
/// With unzipped signatures the installer itself is signed; otherwise the
/// updater archive is.
fn signed_forms(installer: &Path, archive: PathBuf, unzipped_sigs: bool) -> Vec<PathBuf> {
    if unzipped_sigs {
        vec![installer.to_path_buf(), with_suffix(installer, ".sig")]
    } else {
        let sig = with_suffix(&archive, ".sig");
        vec![installer.to_path_buf(), archive, sig]
    }
}

/// Appends `suffix` to the full file name (`App.app` → `App.app.tar.gz`).
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}
