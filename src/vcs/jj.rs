use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use super::{vcs_best_effort, vcs_checked, VcsBackend, VcsKind};
use crate::errors::Result;
use crate::mounts::{HostProbe, Mount};

/// Jujutsu workspaces named after the session.
pub struct JjBackend;

impl JjBackend {
    fn args<'a>(repo: &'a Path, rest: &[&'a OsStr]) -> Vec<&'a OsStr> {
        let mut v: Vec<&OsStr> = vec![OsStr::new("-R"), repo.as_os_str()];
        v.extend_from_slice(rest);
        v
    }

    /// Shared repository store of a jj checkout.
    pub fn repo_store(original_root: &Path) -> PathBuf {
        original_root.join(".jj").join("repo")
    }

    /// Git directory backing a jj repository, when the store points at one that lives
    /// outside `.jj/repo`. A target inside the store is already covered by the store
    /// mount, and nesting a second bind mount under it is skipped.
    pub fn external_git_target(original_root: &Path, probe: &dyn HostProbe) -> Option<PathBuf> {
        let store = Self::repo_store(original_root).join("store");
        let raw = probe.read_to_string(&store.join("git_target"))?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let target = normalize(&store.join(raw));
        let repo = normalize(&Self::repo_store(original_root));
        if target.starts_with(&repo) {
            return None;
        }
        probe.is_dir(&target).then_some(target)
    }
}

/// Lexical normalization (`.` and `..`), without touching the filesystem.
fn normalize(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in p.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

impl VcsBackend for JjBackend {
    fn kind(&self) -> VcsKind {
        VcsKind::Jj
    }

    fn marker(&self) -> &'static str {
        ".jj"
    }

    fn create_isolated_copy(&self, original_root: &Path, token: &str, dest: &Path) -> Result<PathBuf> {
        let args = Self::args(
            original_root,
            &[
                OsStr::new("workspace"),
                OsStr::new("add"),
                OsStr::new("--name"),
                OsStr::new(token),
                dest.as_os_str(),
            ],
        );
        vcs_checked("jj", &args)?;
        Ok(dest.to_path_buf())
    }

    fn destroy_isolated_copy(&self, original_root: &Path, token: &str, isolated_root: &Path) {
        let forget = Self::args(
            original_root,
            &[OsStr::new("workspace"), OsStr::new("forget"), OsStr::new(token)],
        );
        vcs_best_effort("jj", &forget);

        if let Err(e) = fs::remove_dir_all(isolated_root) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %isolated_root.display(), error = %e, "failed to remove workspace directory");
                crate::warn_print(&format!(
                    "cleanup: could not remove {}: {}",
                    isolated_root.display(),
                    e
                ));
            }
        }
    }

    fn metadata_mounts(&self, original_root: &Path, probe: &dyn HostProbe) -> Vec<Mount> {
        let store = Self::repo_store(original_root);
        let mut mounts = vec![Mount::rw(&store, &store)];
        if let Some(git_dir) = Self::external_git_target(original_root, probe) {
            mounts.push(Mount::rw(&git_dir, &git_dir));
        }
        mounts
    }
}
