//! Disposable directories for a run and its cases.
//!
//! A [`Workspace`] owns one fresh root directory for the whole run. Each case
//! gets its own uniquely suffixed subdirectory. The root is removed when the
//! workspace is released or dropped, unless retention was requested.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::WorkspaceError;

/// Prefix of every run root directory.
pub const ROOT_PREFIX: &str = "fileio-mcp-tests_";

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_case_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Run-scoped root directory.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    keep: bool,
    released: bool,
}

impl Workspace {
    /// Create a fresh root under `parent` (system temp dir when `None`).
    ///
    /// # Errors
    ///
    /// [`WorkspaceError::Root`] if the directory cannot be created.
    pub fn create(parent: Option<&Path>, keep: bool) -> Result<Self, WorkspaceError> {
        let parent = parent
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir);
        let root = tempfile::Builder::new()
            .prefix(ROOT_PREFIX)
            .tempdir_in(&parent)
            .map_err(|source| WorkspaceError::Root {
                parent: parent.clone(),
                source,
            })?
            .keep();
        tracing::debug!(root = %root.display(), keep, "workspace created");
        Ok(Self {
            root,
            keep,
            released: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn keep(&self) -> bool {
        self.keep
    }

    /// Create a new, empty directory for `case` inside the root.
    ///
    /// # Errors
    ///
    /// [`WorkspaceError::CaseDir`] if the directory cannot be created.
    pub fn create_case_dir(&self, case: &str) -> Result<PathBuf, WorkspaceError> {
        let prefix = format!("{}_", sanitize_case_name(case));
        tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(&self.root)
            .map(|dir| dir.keep())
            .map_err(|source| WorkspaceError::CaseDir {
                case: case.to_string(),
                root: self.root.clone(),
                source,
            })
    }

    /// Remove the root (unless kept). Returns how many entries could not be removed.
    pub fn release(mut self) -> usize {
        self.release_inner()
    }

    fn release_inner(&mut self) -> usize {
        if self.released {
            return 0;
        }
        self.released = true;
        if self.keep {
            tracing::info!(root = %self.root.display(), "keeping test directory");
            return 0;
        }
        let failures = remove_tree_best_effort(&self.root);
        if failures == 0 {
            tracing::debug!(root = %self.root.display(), "workspace removed");
        }
        failures
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.release_inner();
    }
}

/// Recursively remove `path`, continuing past entries that cannot be removed.
///
/// Every failure is logged at `warn`; the count is returned. A path that is
/// already gone counts as removed.
pub fn remove_tree_best_effort(path: &Path) -> usize {
    let mut failures = 0;
    remove_tree(path, &mut |p, e| {
        failures += 1;
        tracing::warn!(path = %p.display(), error = %e, "cleanup failed");
    });
    failures
}

fn remove_tree(path: &Path, on_error: &mut dyn FnMut(&Path, io::Error)) {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return,
        Err(e) => return on_error(path, e),
    };

    if meta.is_dir() {
        match std::fs::read_dir(path) {
            Ok(entries) => {
                for entry in entries {
                    match entry {
                        Ok(entry) => remove_tree(&entry.path(), on_error),
                        Err(e) => on_error(path, e),
                    }
                }
            }
            Err(e) => on_error(path, e),
        }
        if let Err(e) = std::fs::remove_dir(path) {
            if e.kind() != io::ErrorKind::NotFound {
                on_error(path, e);
            }
        }
    } else if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            on_error(path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_allowed_characters() {
        assert_eq!(
            sanitize_case_name("fileio_read-lines_OK9"),
            "fileio_read-lines_OK9"
        );
    }

    #[test]
    fn sanitize_replaces_everything_else() {
        let inputs = [
            "has spaces",
            "path/with/slashes",
            "dots.and,commas;",
            "ünïcödé ✓",
            "tabs\tand\nnewlines",
            "",
        ];
        for input in inputs {
            let out = sanitize_case_name(input);
            assert!(
                out.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
                "{input:?} -> {out:?}"
            );
            assert_eq!(out.chars().count(), input.chars().count());
        }
        assert_eq!(sanitize_case_name("a b/c"), "a_b_c");
    }

    #[test]
    fn root_and_case_dirs_are_fresh_and_unique() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::create(Some(parent.path()), false).unwrap();
        let root_name = ws.root().file_name().unwrap().to_string_lossy().to_string();
        assert!(root_name.starts_with(ROOT_PREFIX));
        assert_eq!(std::fs::read_dir(ws.root()).unwrap().count(), 0);

        let a = ws.create_case_dir("same name").unwrap();
        let b = ws.create_case_dir("same name").unwrap();
        assert_ne!(a, b);
        assert!(a.is_dir() && b.is_dir());
        assert_eq!(a.parent(), Some(ws.root()));
        assert!(
            a.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("same_name_")
        );
    }

    #[test]
    fn release_removes_root() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::create(Some(parent.path()), false).unwrap();
        let root = ws.root().to_path_buf();
        let case = ws.create_case_dir("c").unwrap();
        std::fs::create_dir_all(case.join("a/b")).unwrap();
        std::fs::write(case.join("a/b/f.txt"), "x").unwrap();
        assert_eq!(ws.release(), 0);
        assert!(!root.exists());
    }

    #[test]
    fn drop_removes_root() {
        let parent = tempfile::tempdir().unwrap();
        let root = {
            let ws = Workspace::create(Some(parent.path()), false).unwrap();
            ws.root().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn keep_retains_root() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::create(Some(parent.path()), true).unwrap();
        let root = ws.root().to_path_buf();
        ws.release();
        assert!(root.is_dir());
    }

    #[test]
    fn missing_path_is_not_a_failure() {
        let parent = tempfile::tempdir().unwrap();
        assert_eq!(remove_tree_best_effort(&parent.path().join("gone")), 0);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlinks_are_removed_not_followed() {
        let parent = tempfile::tempdir().unwrap();
        let outside = parent.path().join("outside.txt");
        std::fs::write(&outside, "keep me").unwrap();
        let tree = parent.path().join("tree");
        std::fs::create_dir(&tree).unwrap();
        std::os::unix::fs::symlink(&outside, tree.join("link")).unwrap();
        std::os::unix::fs::symlink(tree.join("nowhere"), tree.join("dangling")).unwrap();
        assert_eq!(remove_tree_best_effort(&tree), 0);
        assert!(!tree.exists());
        assert!(outside.exists());
    }

    #[cfg(unix)]
    #[test]
    fn release_continues_past_undeletable_entries() {
        use std::os::unix::fs::PermissionsExt;

        // SAFETY: geteuid has no preconditions.
        if unsafe { libc::geteuid() } == 0 {
            // root ignores directory write permission
            return;
        }
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::create(Some(parent.path()), false).unwrap();
        let root = ws.root().to_path_buf();
        let case = ws.create_case_dir("locked").unwrap();
        let locked = case.join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("stuck.txt"), "x").unwrap();
        std::fs::write(case.join("sibling.txt"), "y").unwrap();
        let other = ws.create_case_dir("other").unwrap();
        std::fs::write(other.join("f.txt"), "z").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o500)).unwrap();

        let failures = ws.release();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o700)).unwrap();

        assert!(failures > 0);
        assert!(locked.join("stuck.txt").exists());
        assert!(!case.join("sibling.txt").exists());
        assert!(!other.exists());
        assert!(root.exists());
    }

    #[test]
    fn case_dir_failure_is_workspace_error() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::create(Some(parent.path()), false).unwrap();
        std::fs::remove_dir(ws.root()).unwrap();
        let err = ws.create_case_dir("x").unwrap_err();
        assert!(matches!(err, WorkspaceError::CaseDir { .. }));
    }
}
