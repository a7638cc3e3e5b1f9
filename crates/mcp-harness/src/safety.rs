//! Gate for cases that can mutate privileged state.
//!
//! Dangerous cases run when the operator opted in explicitly, or when the
//! harness can tell it is inside a throwaway container. Every detection
//! heuristic that cannot be evaluated counts as "not sandboxed".

use std::path::{Path, PathBuf};

use crate::config::RunConfig;

/// Control-group fragments that identify a container runtime or orchestrator.
pub const CGROUP_MARKERS: &[&str] = &["docker", "kubepods", "containerd", "podman", "libpod"];

/// Decides whether a case marked dangerous may execute.
pub trait SafetyGate {
    fn is_dangerous_allowed(&self) -> bool;

    /// Human-readable reason printed when a dangerous case is skipped.
    fn skip_reason(&self) -> String {
        "set RUN_DANGEROUS=1, or run inside a container to auto-enable".to_string()
    }
}

/// Container detection from marker files, an env var, and cgroup text.
#[derive(Debug, Clone)]
pub struct SandboxProbe {
    pub docker_marker: PathBuf,
    pub podman_marker: PathBuf,
    /// Captured value of the `container` environment variable.
    pub container_env: Option<String>,
    pub cgroup_file: PathBuf,
}

impl SandboxProbe {
    /// Probe of the running host.
    pub fn system() -> Self {
        Self {
            docker_marker: PathBuf::from("/.dockerenv"),
            podman_marker: PathBuf::from("/run/.containerenv"),
            container_env: std::env::var("container").ok(),
            cgroup_file: PathBuf::from("/proc/self/cgroup"),
        }
    }

    /// True if any heuristic fires.
    pub fn is_sandboxed(&self) -> bool {
        let detected = marker_present(&self.docker_marker)
            || marker_present(&self.podman_marker)
            || self
                .container_env
                .as_deref()
                .is_some_and(|v| !v.is_empty())
            || cgroup_has_marker(&self.cgroup_file);
        tracing::debug!(detected, "sandbox probe");
        detected
    }
}

fn marker_present(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}

fn cgroup_has_marker(path: &Path) -> bool {
    match std::fs::read(path) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            CGROUP_MARKERS.iter().any(|m| text.contains(m))
        }
        Err(_) => false,
    }
}

/// Production gate: explicit opt-in, else sandbox detection.
#[derive(Debug, Clone)]
pub struct EnvironmentGate {
    opt_in: bool,
    detect: bool,
    probe: SandboxProbe,
}

impl EnvironmentGate {
    pub fn new(opt_in: bool, probe: SandboxProbe) -> Self {
        Self {
            opt_in,
            detect: true,
            probe,
        }
    }

    pub fn system(opt_in: bool) -> Self {
        Self::new(opt_in, SandboxProbe::system())
    }

    /// Gate for the host, honouring `run_dangerous` and `ignore_sandbox`.
    pub fn from_config(run: &RunConfig) -> Self {
        let gate = Self::system(run.run_dangerous);
        if run.ignore_sandbox {
            gate.without_detection()
        } else {
            gate
        }
    }

    /// Only the explicit opt-in counts.
    pub fn without_detection(mut self) -> Self {
        self.detect = false;
        self
    }
}

impl SafetyGate for EnvironmentGate {
    fn is_dangerous_allowed(&self) -> bool {
        self.opt_in || (self.detect && self.probe.is_sandboxed())
    }
}
