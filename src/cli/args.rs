//! Command line argument parsing.
//!
//! Every option also reads the CI step input variable `INPUT_<NAME>`, so the
//! binary runs unchanged as a workflow step or from a shell.

use crate::builder::{BuildOptions, HostOs, MobileMode, ReleaseOptions};
use crate::error::{CliError, Result};
use crate::release::ReleaseTarget;
use crate::release::github::DEFAULT_API_URL;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use path_absolutize::Absolutize;
use std::collections::HashMap;
use std::path::PathBuf;

const TAG_REF_PREFIX: &str = "refs/tags/";

/// Build a Tauri app and publish its bundles to a GitHub release
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_tauri",
    version,
    about = "Build a Tauri app and publish its bundles to a GitHub release",
    long_about = "Runs `tauri build` (desktop, Android or iOS) for a project, collects the produced bundles,
and optionally uploads them to a GitHub release together with an updater latest.json.

Usage:
  kodegen_bundler_tauri ./app
  kodegen_bundler_tauri --tag-name 'app-v__VERSION__' --release-name 'App v__VERSION__' ./app
  kodegen_bundler_tauri --release-id 123456 --args '--target universal-apple-darwin'

Exit code 0 = every requested build succeeded and every requested upload finished."
)]
pub struct Args {
    /// Project root (directory containing package.json or the Tauri project)
    #[arg(value_name = "PROJECT_PATH")]
    pub project: Option<PathBuf>,

    /// Project root; takes precedence over the positional path
    #[arg(long, env = "INPUT_PROJECTPATH", value_name = "PATH")]
    pub project_path: Option<PathBuf>,

    /// Build the release variant
    #[arg(long, env = "INPUT_INCLUDERELEASE", default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub include_release: bool,

    /// Build the debug variant
    #[arg(long, env = "INPUT_INCLUDEDEBUG", default_value_t = false, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub include_debug: bool,

    /// Upload an updater latest.json to the release
    #[arg(long, env = "INPUT_INCLUDEUPDATERJSON", default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub include_updater_json: bool,

    /// Use the NSIS installer for the default windows-<arch> updater entry
    #[arg(long, env = "INPUT_UPDATERJSONPREFERNSIS", default_value_t = false, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub updater_json_prefer_nsis: bool,

    /// Keep a darwin-universal entry for universal macOS builds
    #[arg(long, env = "INPUT_UPDATERJSONKEEPUNIVERSAL", default_value_t = false, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub updater_json_keep_universal: bool,

    /// How many times a failed build is retried
    #[arg(long, env = "INPUT_RETRYATTEMPTS", default_value_t = 0, value_name = "N")]
    pub retry_attempts: u32,

    /// Command running the Tauri CLI, e.g. `pnpm tauri` (split on whitespace)
    #[arg(long, env = "INPUT_TAURISCRIPT", value_name = "SCRIPT")]
    pub tauri_script: Option<String>,

    /// Extra arguments for `tauri build`, as one shell-quoted string
    #[arg(long, env = "INPUT_ARGS", value_name = "ARGS", allow_hyphen_values = true)]
    pub args: Option<String>,

    /// Release tag; `__VERSION__` is replaced by the app version
    #[arg(long, env = "INPUT_TAGNAME", value_name = "TAG")]
    pub tag_name: Option<String>,

    /// Existing release to upload into
    #[arg(long, env = "INPUT_RELEASEID", value_name = "ID")]
    pub release_id: Option<u64>,

    /// Release title; `__VERSION__` is replaced by the app version
    #[arg(long, env = "INPUT_RELEASENAME", value_name = "NAME")]
    pub release_name: Option<String>,

    /// Release body and updater notes
    #[arg(long, env = "INPUT_RELEASEBODY", value_name = "BODY")]
    pub release_body: Option<String>,

    /// Create the release as a draft
    #[arg(long, env = "INPUT_RELEASEDRAFT", default_value_t = false, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub release_draft: bool,

    /// Create the release as a prerelease
    #[arg(long, env = "INPUT_PRERELEASE", default_value_t = false, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub prerelease: bool,

    /// Commitish the release tag is created from
    #[arg(long, env = "INPUT_RELEASECOMMITISH", value_name = "COMMITISH")]
    pub release_commitish: Option<String>,

    /// Repository owner (defaults to the owner in GITHUB_REPOSITORY)
    #[arg(long, env = "INPUT_OWNER")]
    pub owner: Option<String>,

    /// Repository name (defaults to the name in GITHUB_REPOSITORY)
    #[arg(long, env = "INPUT_REPO")]
    pub repo: Option<String>,

    /// Mobile build: true/all, android or ios
    #[arg(long, env = "INPUT_MOBILE", default_value = "")]
    pub mobile: String,

    /// GitHub token for release uploads
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub github_api_url: String,

    /// `owner/repo` of the current repository
    #[arg(long, env = "GITHUB_REPOSITORY", value_name = "OWNER/REPO")]
    pub github_repository: Option<String>,

    /// Print verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Pass-through arguments for `tauri build`.
    pub fn tauri_args(&self) -> Result<Vec<String>> {
        let Some(raw) = self.args.as_deref().filter(|a| !a.trim().is_empty()) else {
            return Ok(Vec::new());
        };
        shell_words::split(raw).map_err(|e| {
            CliError::InvalidArguments {
                reason: format!("could not split args '{raw}': {e}"),
            }
            .into()
        })
    }

    /// Project root, absolutized against the working directory.
    pub fn project_root(&self) -> Result<PathBuf> {
        let path = self
            .project_path
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| self.project.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(path.absolutize()?.into_owned())
    }

    /// Build options for the orchestrator.
    pub fn build_options(&self) -> Result<BuildOptions> {
        let args = self.tauri_args()?;
        Ok(BuildOptions {
            project_path: self.project_root()?,
            host: HostOs::current(),
            mobile: MobileMode::parse(&self.mobile),
            include_release: self.include_release,
            include_debug: self.include_debug,
            retry_attempts: self.retry_attempts,
            tauri_script: self.tauri_script.clone().filter(|s| !s.trim().is_empty()),
            config_arg: flag_value(&args, "-c", "--config"),
            target: flag_value(&args, "-t", "--target"),
            args,
            cargo_target_dir: std::env::var_os("CARGO_TARGET_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            env: HashMap::new(),
        })
    }

    /// Release options for the orchestrator.
    ///
    /// Owner and repository are only required when an upload is requested.
    pub fn release_options(&self) -> Result<ReleaseOptions> {
        let (repo_owner, repo_name) = self
            .github_repository
            .as_deref()
            .and_then(|r| r.split_once('/'))
            .map(|(o, r)| (o.to_string(), r.to_string()))
            .unwrap_or_default();

        let target = ReleaseTarget {
            owner: non_empty(self.owner.as_deref()).unwrap_or(repo_owner),
            repo: non_empty(self.repo.as_deref()).unwrap_or(repo_name),
            tag_name: strip_tag_ref(self.tag_name.as_deref()),
            release_id: self.release_id.filter(|id| *id != 0),
            name: strip_tag_ref(self.release_name.as_deref()),
            body: self.release_body.clone().unwrap_or_default(),
            commitish: non_empty(self.release_commitish.as_deref()),
            draft: self.release_draft,
            prerelease: self.prerelease,
        };

        if target.upload_requested() {
            for (argument, value) in [("owner", &target.owner), ("repo", &target.repo)] {
                if value.is_empty() {
                    return Err(CliError::MissingArgument {
                        argument: format!("{argument} (or GITHUB_REPOSITORY)"),
                    }
                    .into());
                }
            }
        }

        Ok(ReleaseOptions {
            target,
            include_updater_json: self.include_updater_json,
            prefer_nsis: self.updater_json_prefer_nsis,
            keep_universal: self.updater_json_keep_universal,
        })
    }
}

/// Value following `short` or `long` (or given as `--long=value`).
pub fn flag_value(args: &[String], short: &str, long: &str) -> Option<String> {
    let inline = format!("{long}=");
    args.iter().enumerate().find_map(|(i, arg)| {
        if arg == short || arg == long {
            args.get(i + 1).cloned()
        } else {
            arg.strip_prefix(&inline).map(String::from)
        }
    })
}

fn strip_tag_ref(value: Option<&str>) -> String {
    value.unwrap_or_default().replace(TAG_REF_PREFIX, "")
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Print an informational line if not in quiet mode
    pub fn info(&self, message: &str) -> std::io::Result<()> {
        self.output.info(message)
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}
