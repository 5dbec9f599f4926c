//! Session identity and the scoped isolated-copy guard.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::vcs::{VcsBackend, VcsKind};

/// Prefix shared by session container names, branches and workspace names.
pub const NAME_PREFIX: &str = "devcontainer-";

/// Docker label carrying the source repository path, used by `exec` discovery.
pub const WORKSPACE_LABEL: &str = "claude-devcontainer.workspace";

pub fn prefixed(name: &str) -> String {
    format!("{NAME_PREFIX}{name}")
}

/// One invocation's unit of work. Built once VCS resolution and isolated-copy
/// creation have happened; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub name: String,
    pub vcs_kind: VcsKind,
    /// Caller's checkout; present only when an isolated copy exists.
    pub original_root: Option<PathBuf>,
    /// Directory mounted at /workspace.
    pub isolated_root: PathBuf,
    pub container_name: String,
    /// Branch (git) or workspace (jj) name needed to destroy the isolated copy.
    pub token: Option<String>,
}

impl Session {
    pub fn isolated(name: &str, kind: VcsKind, original_root: &Path, copy: &IsolatedCopy<'_>) -> Self {
        Session {
            name: name.to_string(),
            vcs_kind: kind,
            original_root: Some(original_root.to_path_buf()),
            isolated_root: copy.path().to_path_buf(),
            container_name: prefixed(name),
            token: Some(copy.token().to_string()),
        }
    }

    /// A session mounting the caller's directory directly. `name` is the
    /// `--name` value if one was given; otherwise the default container name is used.
    pub fn direct(workspace: &Path, name: Option<&str>, default_container_name: &str) -> Self {
        let (name, container_name) = match name {
            Some(n) => (n.to_string(), prefixed(n)),
            None => (
                default_container_name.to_string(),
                default_container_name.to_string(),
            ),
        };
        Session {
            name,
            vcs_kind: VcsKind::None,
            original_root: None,
            isolated_root: workspace.to_path_buf(),
            container_name,
            token: None,
        }
    }

    /// Repository the session belongs to: the original checkout when isolated,
    /// otherwise the mounted directory itself.
    pub fn source_root(&self) -> &Path {
        self.original_root.as_deref().unwrap_or(&self.isolated_root)
    }

    pub fn has_isolated_copy(&self) -> bool {
        self.original_root.is_some()
    }
}

/// Pick a session name: the requested one, or a random suffix whose directory under
/// `scratch` is free. A requested name whose directory is stale gets it removed.
pub fn choose_name(requested: Option<&str>, scratch: &Path) -> Result<String> {
    if let Some(name) = requested {
        let dir = scratch.join(prefixed(name));
        match fs::remove_dir_all(&dir) {
            Ok(()) => tracing::debug!(path = %dir.display(), "removed stale isolated copy directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        return Ok(name.to_string());
    }
    loop {
        let name = crate::util::id::random_suffix();
        if !scratch.join(prefixed(&name)).exists() {
            return Ok(name);
        }
    }
}

/// Handle to a live isolated copy. Release runs exactly once: explicitly via
/// [`IsolatedCopy::release`] or on drop, whichever comes first.
pub struct IsolatedCopy<'a> {
    backend: &'a dyn VcsBackend,
    original_root: PathBuf,
    token: String,
    path: PathBuf,
    released: bool,
}

impl<'a> IsolatedCopy<'a> {
    /// Create the copy through `backend`. On failure nothing is held; the VCS tool is
    /// responsible for not leaving a half-created copy behind.
    pub fn acquire(
        backend: &'a dyn VcsBackend,
        original_root: &Path,
        token: &str,
        dest: &Path,
    ) -> Result<Self> {
        let path = backend.create_isolated_copy(original_root, token, dest)?;
        tracing::info!(vcs = %backend.kind(), path = %path.display(), token, "isolated copy created");
        Ok(IsolatedCopy {
            backend,
            original_root: original_root.to_path_buf(),
            token: token.to_string(),
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn backend(&self) -> &'a dyn VcsBackend {
        self.backend
    }

    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if std::mem::replace(&mut self.released, true) {
            return;
        }
        tracing::info!(path = %self.path.display(), token = %self.token, "destroying isolated copy");
        self.backend
            .destroy_isolated_copy(&self.original_root, &self.token, &self.path);
    }
}

impl Drop for IsolatedCopy<'_> {
    fn drop(&mut self) {
        self.release_once();
    }
}
