//! Kodegen Bundler Tauri - build Tauri apps and publish them to GitHub releases.
//!
//! Exit code 0 means every requested build and upload succeeded.

use kodegen_bundler_tauri::cli;
use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging, `info` unless RUST_LOG says otherwise
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
