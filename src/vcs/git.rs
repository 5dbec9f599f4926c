use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::{vcs_best_effort, vcs_checked, vcs_output, VcsBackend, VcsKind};
use crate::errors::Result;
use crate::mounts::{HostProbe, Mount};

/// Git worktrees on a dedicated branch named after the session.
pub struct GitBackend;

impl GitBackend {
    fn args<'a>(repo: &'a Path, rest: &[&'a OsStr]) -> Vec<&'a OsStr> {
        let mut v: Vec<&OsStr> = vec![OsStr::new("-C"), repo.as_os_str()];
        v.extend_from_slice(rest);
        v
    }

    /// True when `branch` is an ancestor of HEAD, i.e. deleting it loses nothing.
    pub fn branch_is_merged(&self, repo: &Path, branch: &str) -> bool {
        let args = Self::args(
            repo,
            &[
                OsStr::new("merge-base"),
                OsStr::new("--is-ancestor"),
                OsStr::new(branch),
                OsStr::new("HEAD"),
            ],
        );
        vcs_output("git", &args)
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl VcsBackend for GitBackend {
    fn kind(&self) -> VcsKind {
        VcsKind::Git
    }

    fn marker(&self) -> &'static str {
        ".git"
    }

    fn create_isolated_copy(&self, original_root: &Path, token: &str, dest: &Path) -> Result<PathBuf> {
        let args = Self::args(
            original_root,
            &[
                OsStr::new("worktree"),
                OsStr::new("add"),
                OsStr::new("-b"),
                OsStr::new(token),
                dest.as_os_str(),
            ],
        );
        vcs_checked("git", &args)?;
        Ok(dest.to_path_buf())
    }

    fn destroy_isolated_copy(&self, original_root: &Path, token: &str, isolated_root: &Path) {
        let remove = Self::args(
            original_root,
            &[
                OsStr::new("worktree"),
                OsStr::new("remove"),
                OsStr::new("--force"),
                isolated_root.as_os_str(),
            ],
        );
        vcs_best_effort("git", &remove);

        // Unmerged work stays on its branch
        if self.branch_is_merged(original_root, token) {
            let delete = Self::args(
                original_root,
                &[OsStr::new("branch"), OsStr::new("-d"), OsStr::new(token)],
            );
            if vcs_best_effort("git", &delete) {
                tracing::debug!(branch = token, "deleted merged session branch");
            }
        } else {
            let use_err = crate::color_enabled_stderr();
            crate::log_info_stderr(
                use_err,
                &format!("devcontainer: keeping branch {token} (not merged into HEAD)"),
            );
        }
    }

    fn metadata_mounts(&self, original_root: &Path, _probe: &dyn HostProbe) -> Vec<Mount> {
        let git_dir = original_root.join(".git");
        vec![Mount::rw(&git_dir, &git_dir)]
    }
}
