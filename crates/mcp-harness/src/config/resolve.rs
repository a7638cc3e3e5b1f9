//! Config resolution for fileio-mcp-harness.
//!
//! Resolves [`HarnessConfig`] from multiple sources with the following priority
//! (highest to lowest):
//!
//! 1. CLI flags (applied by the caller after [`resolve_config`] returns)
//! 2. Environment variables (`RUN_DANGEROUS`, `KEEP_TEST_DIR`, `FILEIO_HARNESS_*`)
//! 3. `--config <path>`, else `fileio-harness.toml` in the current directory
//! 4. Compiled-in defaults (via [`HarnessConfig::default`])

use super::types::HarnessConfig;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// File name looked up in the current directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "fileio-harness.toml";

/// Resolved configuration plus the file it came from, if any.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub harness: HarnessConfig,
    pub source: Option<PathBuf>,
}

/// Resolve the complete configuration relative to the current directory.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined, or if an
/// explicit `config_path` cannot be read or parsed.
pub fn resolve_config(config_path: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let current_dir = std::env::current_dir()?;
    resolve_config_in(config_path, &current_dir)
}

/// Like [`resolve_config`] but searches `search_dir` for the implicit file.
///
/// A malformed implicit file is logged and ignored; a malformed explicit one
/// is an error.
///
/// # Errors
///
/// Returns an error if an explicit `config_path` cannot be read or parsed.
pub fn resolve_config_in(
    config_path: Option<&Path>,
    search_dir: &Path,
) -> anyhow::Result<ResolvedConfig> {
    let (mut harness, source) = match config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let cfg: HarnessConfig = toml::from_str(&text)
                .with_context(|| format!("failed to parse config file {}", path.display()))?;
            (cfg, Some(path.to_path_buf()))
        }
        None => {
            let candidate = search_dir.join(DEFAULT_CONFIG_FILE);
            match std::fs::read_to_string(&candidate) {
                Ok(text) => match toml::from_str::<HarnessConfig>(&text) {
                    Ok(cfg) => (cfg, Some(candidate)),
                    Err(e) => {
                        tracing::warn!(
                            path = %candidate.display(),
                            error = %e,
                            "ignoring malformed config file"
                        );
                        (HarnessConfig::default(), None)
                    }
                },
                Err(_) => (HarnessConfig::default(), None),
            }
        }
    };

    apply_env_overrides(&mut harness);

    Ok(ResolvedConfig { harness, source })
}

/// Apply environment variable overrides to `cfg`.
///
/// Empty string values are treated as "not set" and do not override existing
/// configuration. The two flags are on only when set to exactly `1`.
fn apply_env_overrides(cfg: &mut HarnessConfig) {
    if let Ok(v) = std::env::var("RUN_DANGEROUS") {
        if !v.is_empty() {
            cfg.run.run_dangerous = v == "1";
        }
    }
    if let Ok(v) = std::env::var("KEEP_TEST_DIR") {
        if !v.is_empty() {
            cfg.run.keep_test_dir = v == "1";
        }
    }
    if let Ok(v) = std::env::var("FILEIO_HARNESS_IGNORE_SANDBOX") {
        if !v.is_empty() {
            cfg.run.ignore_sandbox = v == "1";
        }
    }
    if let Ok(v) = std::env::var("FILEIO_HARNESS_SERVER_BIN") {
        if !v.is_empty() {
            cfg.server.command = Some(PathBuf::from(v));
        }
    }
    if let Ok(v) = std::env::var("FILEIO_HARNESS_WORKDIR") {
        if !v.is_empty() {
            cfg.server.workdir = Some(PathBuf::from(v));
        }
    }
    if let Ok(v) = std::env::var("FILEIO_HARNESS_PROTOCOL_VERSION") {
        if !v.is_empty() {
            cfg.server.protocol_version = v;
        }
    }
    if let Ok(v) = std::env::var("FILEIO_HARNESS_SHUTDOWN_TIMEOUT_MS") {
        if let Ok(ms) = v.parse::<u64>() {
            cfg.server.shutdown_timeout_ms = ms;
        }
    }
}
