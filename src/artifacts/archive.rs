//! Packaging of macOS `.app` directory bundles for upload.
//!
//! Release assets must be files, so a `.app` bundle is replaced by a gzipped
//! tarball next to it. When the updater already produced that tarball (it is
//! signed), the bundle is dropped instead of re-archiving over it.

use super::Artifact;
use super::desktop::with_suffix;
use crate::error::{ActionError, ErrorExt, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::Path;

/// Suffix identifying macOS directory bundles.
pub const APP_BUNDLE_SUFFIX: &str = ".app";

/// Suffix of the compressed sibling.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Replaces `.app` bundles by their `.app.tar.gz` form.
///
/// Bundles without a compressed sibling are archived and their path is
/// rewritten; bundles with one are removed from the list.
pub async fn package_macos_bundles(artifacts: &mut Vec<Artifact>) -> Result<()> {
    let mut packaged = Vec::with_capacity(artifacts.len());

    for mut artifact in artifacts.drain(..) {
        if !is_app_bundle(&artifact.path) {
            packaged.push(artifact);
            continue;
        }

        let archive = with_suffix(&artifact.path, ARCHIVE_SUFFIX);
        if archive.exists() {
            log::info!(
                "{} already exists, not uploading the {} directory",
                archive.display(),
                artifact.path.display()
            );
            continue;
        }

        log::info!(
            "Packaging {} directory into {}",
            artifact.path.display(),
            archive.display()
        );
        archive_app_bundle(&artifact.path, &archive).await?;
        artifact.path = archive;
        packaged.push(artifact);
    }

    *artifacts = packaged;
    Ok(())
}

fn is_app_bundle(path: &Path) -> bool {
    path.to_string_lossy().ends_with(APP_BUNDLE_SUFFIX)
}

/// Writes `bundle` into a gzipped tarball at `archive`.
///
/// The bundle directory is the single top-level entry, the equivalent of
/// `tar czf <archive> -C <parent> <bundle name>`.
pub async fn archive_app_bundle(bundle: &Path, archive: &Path) -> Result<()> {
    let bundle = bundle.to_path_buf();
    let archive = archive.to_path_buf();

    tokio::task::spawn_blocking(move || write_archive(&bundle, &archive))
        .await
        .map_err(|e| ActionError::Anyhow(anyhow::anyhow!("Archive task panicked: {}", e)))?
}

fn write_archive(bundle: &Path, archive: &Path) -> Result<()> {
    let name = bundle.file_name().ok_or_else(|| {
        ActionError::Anyhow(anyhow::anyhow!(
            "Bundle path has no file name: {}",
            bundle.display()
        ))
    })?;

    let file = File::create(archive).fs_context("creating archive", archive)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);
    builder
        .append_dir_all(name, bundle)
        .fs_context("archiving bundle", bundle)?;

    let encoder = builder.into_inner().fs_context("finishing archive", archive)?;
    encoder.finish().fs_context("compressing archive", archive)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;
    use std::path::PathBuf;

    fn app_bundle(dir: &Path) -> PathBuf {
        let app = dir.join("Demo.app");
        fs::create_dir_all(app.join("Contents/MacOS")).unwrap();
        fs::write(app.join("Contents/MacOS/demo"), b"binary").unwrap();
        fs::write(app.join("Contents/Info.plist"), b"<plist/>").unwrap();
        app
    }

    #[tokio::test]
    async fn archives_bundle_without_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_bundle(dir.path());
        let dmg = dir.path().join("Demo_1.0.0_aarch64.dmg");
        fs::write(&dmg, b"dmg").unwrap();

        let mut artifacts = vec![Artifact::new(dmg.clone(), "aarch64"), Artifact::new(app.clone(), "aarch64")];
        package_macos_bundles(&mut artifacts).await.unwrap();

        let archive = dir.path().join("Demo.app.tar.gz");
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].path, dmg);
        assert_eq!(artifacts[1].path, archive);
        assert!(archive.is_file());

        let mut tar = tar::Archive::new(GzDecoder::new(File::open(&archive).unwrap()));
        let entries: Vec<PathBuf> = tar
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().into_owned())
            .collect();
        assert!(entries.contains(&PathBuf::from("Demo.app/Contents/MacOS/demo")));
        assert!(entries.iter().all(|p| p.starts_with("Demo.app")));
    }

    #[tokio::test]
    async fn drops_bundle_with_existing_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_bundle(dir.path());
        let archive = dir.path().join("Demo.app.tar.gz");
        fs::write(&archive, b"signed updater archive").unwrap();

        let mut artifacts = vec![
            Artifact::new(app, "x86_64"),
            Artifact::new(archive.clone(), "x86_64"),
        ];
        package_macos_bundles(&mut artifacts).await.unwrap();

        assert_eq!(artifacts, vec![Artifact::new(archive.clone(), "x86_64")]);
        assert_eq!(fs::read(&archive).unwrap(), b"signed updater archive");
    }
}
