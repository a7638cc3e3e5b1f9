//! Locating the tool-serving executable.
//!
//! An explicit command always wins. Otherwise the first hit in this order is
//! used: a locally built debug binary under the work dir, the binary on
//! `PATH`, and finally `cargo run` inside the work dir.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use fileio_mcp_client::ServerCommand;

use crate::config::ServerConfig;

/// Which discovery rule produced a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Explicit,
    LocalDebug,
    SearchPath,
    CargoRun,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::LocalDebug => "target/debug",
            Self::SearchPath => "PATH",
            Self::CargoRun => "cargo run",
        }
    }
}

/// Resolve the server command for `cfg`, running in `workdir`.
pub fn discover_server(cfg: &ServerConfig, workdir: &Path) -> (ServerCommand, Origin) {
    discover_with_path(cfg, workdir, std::env::var_os("PATH").as_deref())
}

/// [`discover_server`] with an explicit `PATH` value.
pub fn discover_with_path(
    cfg: &ServerConfig,
    workdir: &Path,
    path_var: Option<&OsStr>,
) -> (ServerCommand, Origin) {
    let with_args = |program: PathBuf| {
        ServerCommand::new(program)
            .args(cfg.args.iter().cloned())
            .workdir(workdir)
    };

    if let Some(ref explicit) = cfg.command {
        return (with_args(explicit.clone()), Origin::Explicit);
    }

    let exe = format!("{}{}", cfg.binary, std::env::consts::EXE_SUFFIX);
    let local_debug = workdir.join("target").join("debug").join(&exe);
    if local_debug.is_file() {
        return (with_args(local_debug), Origin::LocalDebug);
    }

    if let Some(found) = path_var.and_then(|p| find_in_path(&exe, p)) {
        return (with_args(found), Origin::SearchPath);
    }

    let cargo = ServerCommand::new("cargo")
        .args(["run", "--quiet", "--"])
        .args(cfg.args.iter().cloned())
        .workdir(workdir);
    (cargo, Origin::CargoRun)
}

fn find_in_path(binary: &str, path_var: &OsStr) -> Option<PathBuf> {
    for segment in std::env::split_paths(path_var) {
        let candidate = segment.join(binary);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    None
}
