//! Tauri CLI invocation resolution.
//!
//! Decides which executable (and leading arguments) run the Tauri CLI for a
//! project: an explicit override, the project's package manager, or a global
//! `@tauri-apps/cli` install.

use super::executor::{execute, retry};
use crate::error::{ActionError, Result};
use crate::metadata::{self, TauriConfig};
use std::collections::HashMap;
use std::path::Path;

/// npm package providing the Tauri CLI.
pub const CLI_PACKAGE: &str = "@tauri-apps/cli";

/// How to invoke the Tauri CLI.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Runner {
    /// Executable: `npm`, `yarn`, `pnpm`, `bun`, `cargo`, a binary path or `tauri`
    pub bin: String,
    /// Leading arguments, e.g. `["tauri"]`, `["run", "tauri"]` or `[]`
    pub tauri_script: Vec<String>,
}

impl Runner {
    /// Creates a runner.
    pub fn new(bin: impl Into<String>, tauri_script: Vec<String>) -> Self {
        Self {
            bin: bin.into(),
            tauri_script,
        }
    }

    /// Full argument list for a Tauri command.
    ///
    /// `npm` needs a `run` sub-verb and a `--` separator before any options so
    /// they reach the script instead of npm itself.
    pub fn command_args(&self, command: &[String], options: &[String]) -> Vec<String> {
        let npm = self.bin == "npm";
        let mut args = Vec::with_capacity(self.tauri_script.len() + command.len() + options.len() + 2);

        if npm && self.tauri_script.first().map(String::as_str) != Some("run") {
            args.push("run".to_string());
        }
        args.extend(self.tauri_script.iter().cloned());
        args.extend(command.iter().cloned());
        if npm && !options.is_empty() {
            args.push("--".to_string());
        }
        args.extend(options.iter().cloned());
        args
    }

    /// Runs a Tauri command in `cwd`, making up to `max_attempts` attempts.
    pub async fn exec_tauri_command(
        &self,
        command: &[String],
        options: &[String],
        cwd: Option<&Path>,
        env: &HashMap<String, String>,
        max_attempts: u32,
    ) -> Result<()> {
        let args = self.command_args(command, options);
        retry(|| execute(&self.bin, &args, cwd, env), max_attempts).await
    }
}

/// Package managers able to run the project-local CLI, in priority order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PackageManager {
    /// yarn
    Yarn,
    /// pnpm
    Pnpm,
    /// bun
    Bun,
    /// npm (fallback)
    Npm,
}

impl PackageManager {
    /// Detects the project's package manager from lockfiles and the
    /// `packageManager` field of `package.json`.
    pub fn detect(root: &Path) -> Self {
        let declared = metadata::read_package_json(root)
            .and_then(|p| p.get("packageManager")?.as_str().map(String::from))
            .unwrap_or_default();
        let uses = |lockfiles: &[&str], name: &str| {
            lockfiles.iter().any(|f| root.join(f).exists())
                || declared.starts_with(&format!("{name}@"))
        };

        if uses(&["yarn.lock"], "yarn") {
            PackageManager::Yarn
        } else if uses(&["pnpm-lock.yaml"], "pnpm") {
            PackageManager::Pnpm
        } else if uses(&["bun.lockb", "bun.lock"], "bun") {
            PackageManager::Bun
        } else {
            PackageManager::Npm
        }
    }

    /// Runner invoking the `tauri` script through this manager.
    pub fn runner(self) -> Runner {
        let tauri = || "tauri".to_string();
        match self {
            PackageManager::Yarn => Runner::new("yarn", vec![tauri()]),
            PackageManager::Pnpm => Runner::new("pnpm", vec![tauri()]),
            PackageManager::Bun => Runner::new("bun", vec![tauri()]),
            PackageManager::Npm => Runner::new("npm", vec!["run".to_string(), tauri()]),
        }
    }
}

/// Splits an explicit `tauriScript` override into executable and leading args.
///
/// This is a plain whitespace split: an executable path containing spaces is
/// split as well.
pub fn parse_override(tauri_script: &str) -> Option<Runner> {
    let mut parts = tauri_script.split_whitespace().map(String::from);
    let bin = parts.next()?;
    Some(Runner::new(bin, parts.collect()))
}

/// Resolves the runner for the project at `root`.
///
/// Without an override or a local `@tauri-apps/cli` dependency this installs
/// the CLI globally with npm, matching the major version of the project config.
pub async fn resolve_runner(root: &Path, tauri_script: Option<&str>) -> Result<Runner> {
    if let Some(runner) = tauri_script.and_then(parse_override) {
        log::info!("Using tauriScript override: {} {}", runner.bin, runner.tauri_script.join(" "));
        return Ok(runner);
    }

    if metadata::has_dependency(CLI_PACKAGE, root) {
        let manager = PackageManager::detect(root);
        log::info!("Using {:?} to run the project-local Tauri CLI", manager);
        return Ok(manager.runner());
    }

    let tag = detect_cli_tag(root).unwrap_or_else(|e| {
        log::debug!("{}; defaulting to Tauri CLI v1", e);
        "v1"
    });
    install_global_cli(tag).await?;

    Ok(Runner::new("tauri", Vec::new()))
}

/// npm dist-tag of the Tauri CLI matching the project's config version.
pub fn detect_cli_tag(root: &Path) -> Result<&'static str> {
    let tauri_dir = metadata::find_tauri_dir(root).ok_or_else(|| {
        ActionError::ConfigDetection(format!("no Tauri project under {}", root.display()))
    })?;
    let config = TauriConfig::from_base_config(&tauri_dir)
        .map_err(|e| ActionError::ConfigDetection(e.to_string()))?;
    Ok(if config.is_v2() { "v2" } else { "v1" })
}

async fn install_global_cli(tag: &str) -> Result<()> {
    log::info!("Installing {}@{} globally", CLI_PACKAGE, tag);
    let args = vec![
        "install".to_string(),
        "-g".to_string(),
        format!("{CLI_PACKAGE}@{tag}"),
    ];
    execute("npm", &args, None, &HashMap::new()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn project_with_cli(lockfile: Option<&str>) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "devDependencies": { "@tauri-apps/cli": "^2.0.0" } }"#,
        )
        .unwrap();
        if let Some(lockfile) = lockfile {
            fs::write(dir.path().join(lockfile), "").unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn picks_package_manager_from_lockfile() {
        let cases = [
            (Some("yarn.lock"), "yarn", vec!["tauri"]),
            (Some("pnpm-lock.yaml"), "pnpm", vec!["tauri"]),
            (Some("bun.lockb"), "bun", vec!["tauri"]),
            (None, "npm", vec!["run", "tauri"]),
        ];
        for (lockfile, bin, script) in cases {
            let dir = project_with_cli(lockfile);
            let runner = resolve_runner(dir.path(), None).await.unwrap();
            assert_eq!(runner.bin, bin);
            assert_eq!(runner.tauri_script, strings(&script));
        }
    }

    #[test]
    fn package_manager_field_is_a_signal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "packageManager": "pnpm@9.1.0" }"#,
        )
        .unwrap();
        assert_eq!(PackageManager::detect(dir.path()), PackageManager::Pnpm);
    }

    #[test]
    fn yarn_wins_over_other_lockfiles() {
        let dir = project_with_cli(Some("pnpm-lock.yaml"));
        fs::write(dir.path().join("yarn.lock"), "").unwrap();
        assert_eq!(PackageManager::detect(dir.path()), PackageManager::Yarn);
    }

    #[tokio::test]
    async fn explicit_override_is_split_on_whitespace() {
        let dir = project_with_cli(Some("yarn.lock"));
        let runner = resolve_runner(dir.path(), Some("cargo tauri")).await.unwrap();
        assert_eq!(runner, Runner::new("cargo", strings(&["tauri"])));

        let runner = parse_override("/opt/my tools/tauri").unwrap();
        assert_eq!(runner.bin, "/opt/my");
        assert_eq!(runner.tauri_script, strings(&["tools/tauri"]));

        assert!(parse_override("   ").is_none());
    }

    #[test]
    fn npm_gets_run_and_separator() {
        let runner = Runner::new("npm", strings(&["run", "tauri"]));
        assert_eq!(
            runner.command_args(&strings(&["android", "build"]), &strings(&["--debug"])),
            strings(&["run", "tauri", "android", "build", "--", "--debug"])
        );

        let runner = Runner::new("npm", strings(&["tauri"]));
        assert_eq!(
            runner.command_args(&strings(&["build"]), &[]),
            strings(&["run", "tauri", "build"])
        );
    }

    #[test]
    fn other_runners_are_not_reshaped() {
        let runner = Runner::new("yarn", strings(&["tauri"]));
        assert_eq!(
            runner.command_args(&strings(&["build"]), &strings(&["--target", "x86_64-pc-windows-msvc"])),
            strings(&["tauri", "build", "--target", "x86_64-pc-windows-msvc"])
        );
        let runner = Runner::new("tauri", Vec::new());
        assert_eq!(
            runner.command_args(&strings(&["ios", "build"]), &strings(&["--debug"])),
            strings(&["ios", "build", "--debug"])
        );
    }

    #[test]
    fn cli_tag_detection_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(detect_cli_tag(dir.path()).is_err());

        fs::create_dir_all(dir.path().join("src-tauri")).unwrap();
        fs::write(dir.path().join("src-tauri/tauri.conf.json"), "{ not json").unwrap();
        assert!(matches!(
            detect_cli_tag(dir.path()),
            Err(ActionError::ConfigDetection(_))
        ));

        fs::write(
            dir.path().join("src-tauri/tauri.conf.json"),
            r#"{ "identifier": "com.v2.app" }"#,
        )
        .unwrap();
        assert_eq!(detect_cli_tag(dir.path()).unwrap(), "v2");

        fs::write(
            dir.path().join("src-tauri/tauri.conf.json"),
            r#"{ "package": {}, "tauri": { "bundle": {} } }"#,
        )
        .unwrap();
        assert_eq!(detect_cli_tag(dir.path()).unwrap(), "v1");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exec_retries_failing_command() {
        let dir = tempfile::tempdir().unwrap();
        // Appends one line per attempt, then fails
        let runner = Runner::new("sh", strings(&["-c", "echo x >> attempts.log; exit 3"]));
        let err = runner
            .exec_tauri_command(&[], &[], Some(dir.path()), &HashMap::new(), 3)
            .await
            .unwrap_err();
        assert!(err.is_process_failure());
        let log = fs::read_to_string(dir.path().join("attempts.log")).unwrap();
        assert_eq!(log.lines().count(), 3);
    }
}
