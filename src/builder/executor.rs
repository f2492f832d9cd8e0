//! External process execution with bounded retry.

use crate::error::{ActionError, Result};
use std::collections::HashMap;
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Runs `program` with `args` and waits for it to exit.
///
/// Output is streamed line by line to this process' stdout/stderr while the
/// child runs. A non-zero exit or a spawn failure becomes
/// [`ActionError::ProcessFailure`].
pub async fn execute(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
    env: &HashMap<String, String>,
) -> Result<()> {
    let command_line = display_command(program, args);
    log::info!("running {}", command_line);

    let mut command = Command::new(resolve_program(program, cwd, env));
    command
        .args(args)
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let mut child = command
        .spawn()
        .map_err(|e| ActionError::spawn_error(command_line.clone(), &e))?;

    // Drain both pipes concurrently so neither can fill up and stall the child
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    tokio::join!(
        async {
            if let Some(stdout) = stdout {
                forward_lines(stdout, |line| println!("{line}")).await;
            }
        },
        async {
            if let Some(stderr) = stderr {
                forward_lines(stderr, |line| eprintln!("{line}")).await;
            }
        }
    );

    let status = child
        .wait()
        .await
        .map_err(|e| ActionError::spawn_error(command_line.clone(), &e))?;

    if status.success() {
        Ok(())
    } else {
        Err(ActionError::ProcessFailure {
            command: command_line,
            exit_code: status.code(),
            reason: match status.code() {
                Some(_) => "non-zero exit".to_string(),
                None => "terminated by signal".to_string(),
            },
        })
    }
}

/// Resolves `program` through `PATH` the way a shell would.
///
/// `.cmd` shims such as `npm` on Windows are only found this way. Relative
/// paths resolve against `cwd`, and a `PATH` in `env` wins over the ambient
/// one. Falls back to the bare name when nothing matches.
pub fn resolve_program(program: &str, cwd: Option<&Path>, env: &HashMap<String, String>) -> PathBuf {
    let paths = env
        .get("PATH")
        .map(OsString::from)
        .or_else(|| std::env::var_os("PATH"));
    let dir = match cwd {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().unwrap_or_default(),
    };

    match which::which_in(program, paths, &dir) {
        Ok(path) => {
            log::debug!("resolved {} to {}", program, path.display());
            path
        }
        Err(e) => {
            log::debug!("{} not found in PATH ({}), spawning as given", program, e);
            PathBuf::from(program)
        }
    }
}

/// Forwards `reader` line by line until EOF.
///
/// Invalid UTF-8 is replaced rather than ending the drain, which would close
/// the pipe under the child.
async fn forward_lines<R, F>(reader: R, mut emit: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                emit(line.trim_end_matches(['\n', '\r']));
            }
            Err(e) => {
                log::warn!("failed to read child output: {}", e);
                break;
            }
        }
    }
}

/// Calls `operation` until it succeeds or `max_attempts` attempts have failed.
///
/// Attempts are immediate, with no delay between them. `max_attempts` of 0 is
/// treated as 1. When every attempt fails, the last error is returned as is.
pub async fn retry<F, Fut, T>(mut operation: F, max_attempts: u32) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                log::warn!(
                    "attempt {}/{} failed: {}. Retrying...",
                    attempt,
                    max_attempts,
                    e
                );
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Formats a command line for logs and error messages.
pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
