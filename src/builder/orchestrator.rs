//! Build-and-release orchestration.
//!
//! This module provides the [`Orchestrator`] that builds the selected
//! `(platform, variant)` pairs, collects their artifacts, and hands them to a
//! [`ReleaseClient`] for release resolution and upload.

use super::runner::{Runner, resolve_runner};
use super::target::{BuildTarget, HostOs, MobileMode, Platform, Variant, build_targets, select_platform};
use crate::artifacts::{self, Artifact, LocateOptions, archive};
use crate::error::{ActionError, Result};
use crate::metadata::{self, ProjectInfo, TargetInfo, TargetPlatform};
use crate::release::{ReleaseClient, ReleaseData, ReleaseTarget, UpdateManifestParams};
use std::collections::HashMap;
use std::path::PathBuf;

/// What to build and how to invoke the Tauri CLI.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    /// Root of the frontend project (where `package.json` lives)
    pub project_path: PathBuf,
    /// Host OS, used for mobile platform selection
    pub host: HostOs,
    /// Requested mobile mode
    pub mobile: MobileMode,
    /// Build the release variant
    pub include_release: bool,
    /// Build the debug variant
    pub include_debug: bool,
    /// Retries after a failed build; attempts are `retry_attempts + 1`
    pub retry_attempts: u32,
    /// Runner override (`tauriScript`)
    pub tauri_script: Option<String>,
    /// Pass-through arguments for `tauri build`
    pub args: Vec<String>,
    /// Value of `-c/--config` in `args`
    pub config_arg: Option<String>,
    /// Value of `-t/--target` in `args`
    pub target: Option<String>,
    /// `CARGO_TARGET_DIR` of the calling environment
    pub cargo_target_dir: Option<PathBuf>,
    /// Extra environment for the build process
    pub env: HashMap<String, String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            project_path: PathBuf::from("."),
            host: HostOs::current(),
            mobile: MobileMode::None,
            include_release: true,
            include_debug: false,
            retry_attempts: 0,
            tauri_script: None,
            args: Vec::new(),
            config_arg: None,
            target: None,
            cargo_target_dir: None,
            env: HashMap::new(),
        }
    }
}

/// Where and how to publish.
#[derive(Clone, Debug, Default)]
pub struct ReleaseOptions {
    /// Release identification and metadata
    pub target: ReleaseTarget,
    /// Upload `latest.json`
    pub include_updater_json: bool,
    /// Prefer NSIS over MSI in the default Windows entry
    pub prefer_nsis: bool,
    /// Keep `darwin-universal` in the manifest
    pub keep_universal: bool,
}

/// Result of a successful run.
#[derive(Clone, Debug, Default)]
pub struct RunOutcome {
    /// Artifacts after packaging, in discovery order
    pub artifacts: Vec<Artifact>,
    /// Resolved app version
    pub version: String,
    /// Release created or found by tag
    pub release: Option<ReleaseData>,
    /// Whether assets were uploaded
    pub uploaded: bool,
}

/// Artifacts per bucket. The updater manifest only reads release and debug.
#[derive(Debug, Default)]
struct Buckets {
    release: Vec<Artifact>,
    debug: Vec<Artifact>,
    mobile: Vec<Artifact>,
}

impl Buckets {
    fn bucket_mut(&mut self, build: BuildTarget) -> &mut Vec<Artifact> {
        match (build.platform, build.variant) {
            (Platform::Desktop, Variant::Release) => &mut self.release,
            (Platform::Desktop, Variant::Debug) => &mut self.debug,
            (Platform::Android | Platform::Ios, _) => &mut self.mobile,
        }
    }

    fn all(&self) -> Vec<Artifact> {
        self.release
            .iter()
            .chain(&self.debug)
            .chain(&self.mobile)
            .cloned()
            .collect()
    }

    fn updater_artifacts(&self) -> &[Artifact] {
        if self.release.is_empty() {
            &self.debug
        } else {
            &self.release
        }
    }
}

/// Drives one build-and-release run.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_tauri::builder::{BuildOptions, Orchestrator, ReleaseOptions};
/// use kodegen_bundler_tauri::release::GitHubClient;
///
/// # async fn example() -> kodegen_bundler_tauri::error::Result<()> {
/// let client = GitHubClient::new("https://api.github.com", None)?;
/// let outcome = Orchestrator::new(client, BuildOptions::default(), ReleaseOptions::default())
///     .run()
///     .await?;
/// println!("built {} artifacts", outcome.artifacts.len());
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<C> {
    client: C,
    build: BuildOptions,
    release: ReleaseOptions,
}

impl<C: ReleaseClient> Orchestrator<C> {
    /// Creates an orchestrator publishing through `client`.
    pub fn new(client: C, build: BuildOptions, release: ReleaseOptions) -> Self {
        Self { client, build, release }
    }

    /// The release client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Builds, collects, packages and publishes.
    pub async fn run(&self) -> Result<RunOutcome> {
        let platform = select_platform(self.build.host, self.build.mobile);
        let builds = build_targets(platform, self.build.include_release, self.build.include_debug);

        let root = &self.build.project_path;
        let info = metadata::load_project_info(root, self.build.config_arg.as_deref())?;
        let target_info = match platform {
            Platform::Desktop => TargetInfo::from_triple(self.build.target.as_deref()),
            Platform::Android => TargetInfo::mobile(TargetPlatform::Android),
            Platform::Ios => TargetInfo::mobile(TargetPlatform::Ios),
        };
        let locate_options = LocateOptions {
            cargo_target_dir: self.build.cargo_target_dir.clone(),
            target: Some(target_info.clone()),
        };

        let mut runner: Option<Runner> = None;
        let mut buckets = Buckets::default();
        for build in builds {
            if runner.is_none() {
                runner = Some(resolve_runner(root, self.build.tauri_script.as_deref()).await?);
            }
            if let Some(runner) = &runner {
                let found = self.build_one(runner, build, &info, &locate_options).await?;
                buckets.bucket_mut(build).extend(found);
            }
        }

        let mut artifacts = buckets.all();
        if artifacts.is_empty() {
            if self.release.target.upload_requested() {
                return Err(ActionError::NoArtifactsFound);
            }
            log::info!(
                "No artifacts were found. The action was not configured to upload artifacts, therefore this is not handled as an error."
            );
            return Ok(RunOutcome {
                version: info.version,
                ..Default::default()
            });
        }

        log::info!(
            "Found artifacts:\n{}",
            artifacts
                .iter()
                .map(|a| a.path.display().to_string())
                .collect::<Vec<_>>()
                .join("\n")
        );

        if target_info.platform == TargetPlatform::MacOs {
            archive::package_macos_bundles(&mut artifacts).await?;
        }

        let (release, uploaded) = self.publish(&artifacts, &buckets, &info, &target_info).await?;

        Ok(RunOutcome {
            artifacts,
            version: info.version,
            release,
            uploaded,
        })
    }

    /// Runs the build for one target and returns what it produced.
    async fn build_one(
        &self,
        runner: &Runner,
        build: BuildTarget,
        info: &ProjectInfo,
        locate_options: &LocateOptions,
    ) -> Result<Vec<Artifact>> {
        log::info!("Building {}", build);

        let command: Vec<String> = build
            .platform
            .cli_verb()
            .into_iter()
            .chain(["build"])
            .map(String::from)
            .collect();
        let mut options = Vec::with_capacity(self.build.args.len() + 1);
        if build.variant.is_debug() {
            options.push("--debug".to_string());
        }
        options.extend(self.build.args.iter().cloned());

        let attempts = self.build.retry_attempts.saturating_add(1);
        runner
            .exec_tauri_command(&command, &options, Some(self.build.project_path.as_path()), &self.build.env, attempts)
            .await?;

        Ok(artifacts::locate(build, info, locate_options))
    }

    /// Resolves the release and uploads. Returns the resolved release and
    /// whether anything was uploaded.
    async fn publish(
        &self,
        artifacts: &[Artifact],
        buckets: &Buckets,
        info: &ProjectInfo,
        target_info: &TargetInfo,
    ) -> Result<(Option<ReleaseData>, bool)> {
        let mut target = self.release.target.clone();
        let mut resolved = None;

        if !target.tag_name.is_empty() && target.release_id.is_none() {
            target.apply_templates(&info.version);
            let data = self.client.get_or_create_release(&target).await?;
            target.release_id = Some(data.id);
            resolved = Some(data);
        }

        let Some(release_id) = target.release_id else {
            log::info!("No releaseId or tagName provided, skipping all uploads...");
            return Ok((resolved, false));
        };

        self.client
            .upload_assets(&target.owner, &target.repo, release_id, artifacts)
            .await?;

        if self.release.include_updater_json {
            let params = UpdateManifestParams {
                owner: &target.owner,
                repo: &target.repo,
                version: &info.version,
                notes: &target.body,
                tag_name: &target.tag_name,
                release_id,
                artifacts: buckets.updater_artifacts(),
                target: target_info,
                unzipped_sigs: info.unzipped_sigs,
                prefer_nsis: self.release.prefer_nsis,
                keep_universal: self.release.keep_universal,
            };
            self.client.upload_update_manifest(&params).await?;
        }

        Ok((resolved, true))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        GetOrCreate { tag: String, name: String, body: String },
        UploadAssets { release_id: u64, paths: Vec<PathBuf> },
        UploadManifest { release_id: u64, tag: String, notes: String, paths: Vec<PathBuf> },
    }

    #[derive(Default)]
    struct RecordingClient {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingClient {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ReleaseClient for RecordingClient {
        async fn get_or_create_release(&self, target: &ReleaseTarget) -> Result<ReleaseData> {
            self.calls.lock().unwrap().push(Call::GetOrCreate {
                tag: target.tag_name.clone(),
                name: target.name.clone(),
                body: target.body.clone(),
            });
            Ok(ReleaseData {
                id: 42,
                upload_url: "https://uploads.example/42/assets{?name,label}".into(),
                html_url: "https://example/releases/42".into(),
            })
        }

        async fn upload_assets(&self, _owner: &str, _repo: &str, release_id: u64, artifacts: &[Artifact]) -> Result<()> {
            self.calls.lock().unwrap().push(Call::UploadAssets {
                release_id,
                paths: artifacts.iter().map(|a| a.path.clone()).collect(),
            });
            Ok(())
        }

        async fn upload_update_manifest(&self, params: &UpdateManifestParams<'_>) -> Result<()> {
            self.calls.lock().unwrap().push(Call::UploadManifest {
                release_id: params.release_id,
                tag: params.tag_name.to_string(),
                notes: params.notes.to_string(),
                paths: params.artifacts.iter().map(|a| a.path.clone()).collect(),
            });
            Ok(())
        }
    }

    const TRIPLE: &str = "x86_64-unknown-linux-gnu";

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let tauri = dir.path().join("src-tauri");
        fs::create_dir_all(&tauri).unwrap();
        fs::write(
            tauri.join("tauri.conf.json"),
            r#"{ "productName": "demo", "version": "0.3.0", "identifier": "com.example.demo" }"#,
        )
        .unwrap();
        dir
    }

    fn bundle_path(root: &Path, variant: &str) -> PathBuf {
        root.join("target")
            .join(TRIPLE)
            .join(variant)
            .join("bundle/deb/demo_0.3.0_amd64.deb")
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"deb").unwrap();
    }

    fn build_options(root: &Path, script: &str) -> BuildOptions {
        BuildOptions {
            project_path: root.to_path_buf(),
            host: HostOs::Linux,
            tauri_script: Some(script.to_string()),
            args: vec!["--target".into(), TRIPLE.into()],
            target: Some(TRIPLE.into()),
            cargo_target_dir: Some(root.join("target")),
            ..Default::default()
        }
    }

    fn tagged(tag: &str) -> ReleaseOptions {
        ReleaseOptions {
            target: ReleaseTarget {
                owner: "o".into(),
                repo: "r".into(),
                tag_name: tag.into(),
                name: "Demo __VERSION__".into(),
                body: "Release __VERSION__".into(),
                ..Default::default()
            },
            include_updater_json: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn desktop_release_without_tag_builds_and_skips_upload() {
        let dir = project();
        let deb = bundle_path(dir.path(), "release");
        touch(&deb);

        let orchestrator = Orchestrator::new(
            RecordingClient::default(),
            build_options(dir.path(), "true"),
            ReleaseOptions::default(),
        );
        let outcome = orchestrator.run().await.unwrap();

        assert_eq!(outcome.artifacts, vec![Artifact::new(deb, "x86_64")]);
        assert_eq!(outcome.version, "0.3.0");
        assert!(!outcome.uploaded);
        assert!(outcome.release.is_none());
        assert!(orchestrator.client().calls().is_empty());
    }

    #[tokio::test]
    async fn nothing_found_without_tag_is_success() {
        let dir = project();
        let orchestrator = Orchestrator::new(
            RecordingClient::default(),
            build_options(dir.path(), "true"),
            ReleaseOptions::default(),
        );
        let outcome = orchestrator.run().await.unwrap();
        assert!(outcome.artifacts.is_empty());
        assert!(!outcome.uploaded);
    }

    #[tokio::test]
    async fn nothing_found_with_tag_fails() {
        let dir = project();
        let orchestrator = Orchestrator::new(
            RecordingClient::default(),
            build_options(dir.path(), "true"),
            tagged("v__VERSION__"),
        );
        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(err, ActionError::NoArtifactsFound));
        assert!(orchestrator.client().calls().is_empty());
    }

    #[tokio::test]
    async fn build_failure_aborts_after_retries() {
        let dir = project();
        touch(&bundle_path(dir.path(), "release"));
        let mut options = build_options(dir.path(), "false");
        options.retry_attempts = 2;

        let orchestrator = Orchestrator::new(RecordingClient::default(), options, tagged("v1"));
        let err = orchestrator.run().await.unwrap_err();
        assert!(err.is_process_failure());
        assert!(orchestrator.client().calls().is_empty());
    }

    #[tokio::test]
    async fn templates_are_applied_before_release_lookup() {
        let dir = project();
        let deb = bundle_path(dir.path(), "release");
        touch(&deb);

        let orchestrator = Orchestrator::new(
            RecordingClient::default(),
            build_options(dir.path(), "true"),
            tagged("app-v__VERSION__"),
        );
        let outcome = orchestrator.run().await.unwrap();

        assert!(outcome.uploaded);
        assert_eq!(outcome.release.map(|r| r.id), Some(42));
        assert_eq!(
            orchestrator.client().calls(),
            vec![
                Call::GetOrCreate {
                    tag: "app-v0.3.0".into(),
                    name: "Demo 0.3.0".into(),
                    body: "Release 0.3.0".into(),
                },
                Call::UploadAssets { release_id: 42, paths: vec![deb.clone()] },
                Call::UploadManifest {
                    release_id: 42,
                    tag: "app-v0.3.0".into(),
                    notes: "Release 0.3.0".into(),
                    paths: vec![deb],
                },
            ]
        );
    }

    #[tokio::test]
    async fn release_id_skips_lookup_and_manifest_falls_back_to_debug() {
        let dir = project();
        let deb = bundle_path(dir.path(), "debug");
        touch(&deb);

        let mut options = build_options(dir.path(), "true");
        options.include_debug = true;
        let release = ReleaseOptions {
            target: ReleaseTarget {
                owner: "o".into(),
                repo: "r".into(),
                release_id: Some(7),
                tag_name: "v__VERSION__".into(),
                ..Default::default()
            },
            include_updater_json: true,
            ..Default::default()
        };

        let orchestrator = Orchestrator::new(RecordingClient::default(), options, release);
        let outcome = orchestrator.run().await.unwrap();

        assert!(outcome.uploaded);
        assert!(outcome.release.is_none());
        assert_eq!(
            orchestrator.client().calls(),
            vec![
                Call::UploadAssets { release_id: 7, paths: vec![deb.clone()] },
                Call::UploadManifest {
                    release_id: 7,
                    tag: "v__VERSION__".into(),
                    notes: String::new(),
                    paths: vec![deb],
                },
            ]
        );
    }

    const MAC_TRIPLE: &str = "aarch64-apple-darwin";

    fn mac_bundle(root: &Path) -> PathBuf {
        let bundle = root.join("target").join(MAC_TRIPLE).join("release/bundle/macos/demo.app");
        fs::create_dir_all(bundle.join("Contents/MacOS")).unwrap();
        fs::write(bundle.join("Contents/MacOS/demo"), b"bin").unwrap();
        bundle
    }

    fn mac_options(root: &Path) -> BuildOptions {
        BuildOptions {
            args: vec!["--target".into(), MAC_TRIPLE.into()],
            target: Some(MAC_TRIPLE.into()),
            ..build_options(root, "true")
        }
    }

    #[tokio::test]
    async fn macos_app_bundle_is_archived_and_uploaded() {
        let dir = project();
        let bundle = mac_bundle(dir.path());
        let archive = bundle.with_file_name("demo.app.tar.gz");

        let orchestrator = Orchestrator::new(
            RecordingClient::default(),
            mac_options(dir.path()),
            ReleaseOptions {
                include_updater_json: false,
                ..tagged("v__VERSION__")
            },
        );
        let outcome = orchestrator.run().await.unwrap();

        assert_eq!(outcome.artifacts, vec![Artifact::new(archive.clone(), "aarch64")]);
        assert!(archive.is_file());
        assert_eq!(
            orchestrator.client().calls()[1],
            Call::UploadAssets { release_id: 42, paths: vec![archive] }
        );
    }

    #[tokio::test]
    async fn macos_app_bundle_dropped_when_updater_archive_exists() {
        let dir = project();
        let bundle = mac_bundle(dir.path());
        let archive = bundle.with_file_name("demo.app.tar.gz");
        fs::write(&archive, b"signed archive").unwrap();

        let orchestrator = Orchestrator::new(
            RecordingClient::default(),
            mac_options(dir.path()),
            ReleaseOptions::default(),
        );
        let outcome = orchestrator.run().await.unwrap();

        assert_eq!(outcome.artifacts, vec![Artifact::new(archive.clone(), "aarch64")]);
        assert_eq!(fs::read(&archive).unwrap(), b"signed archive");
    }

    #[tokio::test]
    async fn linux_target_does_not_package_app_directories() {
        let dir = project();
        let stray = dir.path().join("target").join(TRIPLE).join("release/bundle/macos/demo.app");
        fs::create_dir_all(&stray).unwrap();
        let deb = bundle_path(dir.path(), "release");
        touch(&deb);

        let orchestrator = Orchestrator::new(
            RecordingClient::default(),
            build_options(dir.path(), "true"),
            ReleaseOptions::default(),
        );
        let outcome = orchestrator.run().await.unwrap();

        assert_eq!(outcome.artifacts, vec![Artifact::new(deb, "x86_64")]);
        assert!(!stray.with_file_name("demo.app.tar.gz").exists());
    }

    #[tokio::test]
    async fn missing_project_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            RecordingClient::default(),
            build_options(dir.path(), "true"),
            ReleaseOptions::default(),
        );
        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(err, ActionError::MissingProjectPath { .. }));
    }

    #[test]
    fn updater_artifacts_prefer_release_bucket() {
        let mut buckets = Buckets::default();
        buckets.debug.push(Artifact::new("/d", "x86_64"));
        assert_eq!(buckets.updater_artifacts(), &[Artifact::new("/d", "x86_64")]);
        buckets.release.push(Artifact::new("/r", "x86_64"));
        assert_eq!(buckets.updater_artifacts(), &[Artifact::new("/r", "x86_64")]);
        buckets.mobile.push(Artifact::new("/m", "mobile"));
        assert_eq!(buckets.all().len(), 3);
    }
}
