//! Configuration types for fileio-mcp-harness.
//!
//! [`HarnessConfig`] is deserialized from `fileio-harness.toml`. Both tables
//! are optional and every field has a default, so an empty file (or no file)
//! produces a working configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How to locate and launch the tool-serving process.
///
/// # Example
///
/// ```toml
/// [server]
/// binary = "fileio-mcp"
/// args = ["serve", "--mode", "stdio"]
/// protocol_version = "2025-11-25"
/// shutdown_timeout_ms = 2000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Executable name used by discovery (default: `"fileio-mcp"`)
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Explicit executable path; skips discovery when set
    #[serde(default)]
    pub command: Option<PathBuf>,

    /// Arguments selecting stdio serve mode
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Server working directory and discovery root (default: current directory)
    #[serde(default)]
    pub workdir: Option<PathBuf>,

    /// Protocol revision sent in `initialize`
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,

    /// Wait between SIGTERM and SIGKILL during teardown
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

/// Per-run switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Run cases marked dangerous regardless of sandbox detection
    #[serde(default)]
    pub run_dangerous: bool,

    /// Retain the workspace root after the run
    #[serde(default)]
    pub keep_test_dir: bool,

    /// Do not auto-enable dangerous cases when running inside a container
    #[serde(default)]
    pub ignore_sandbox: bool,

    /// Only run cases whose name contains this substring
    #[serde(default)]
    pub filter: Option<String>,

    /// Parent directory for the workspace root (default: system temp dir)
    #[serde(default)]
    pub temp_parent: Option<PathBuf>,
}

/// Root of `fileio-harness.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub run: RunConfig,
}

fn default_binary() -> String {
    "fileio-mcp".to_string()
}

fn default_args() -> Vec<String> {
    ["serve", "--mode", "stdio"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_protocol_version() -> String {
    fileio_mcp_client::DEFAULT_PROTOCOL_VERSION.to_string()
}

fn default_shutdown_timeout_ms() -> u64 {
    2000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            command: None,
            args: default_args(),
            workdir: None,
            protocol_version: default_protocol_version(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}
