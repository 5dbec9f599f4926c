//! Version-control backends that create and destroy per-session isolated copies.
//!
//! Each backend is identified by a marker directory (`.git`, `.jj`). Detection walks
//! upward from a start directory and returns the nearest ancestor carrying a marker.

mod git;
mod jj;

pub use git::GitBackend;
pub use jj::JjBackend;

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::str::FromStr;

use crate::errors::{Result, SessionError};
use crate::mounts::{HostProbe, Mount};
use crate::util::shell_join;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum VcsKind {
    None,
    Git,
    Jj,
}

impl VcsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VcsKind::None => "none",
            VcsKind::Git => "git",
            VcsKind::Jj => "jj",
        }
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses an explicit override. Only real backends are accepted; "none" is what
/// detection yields, never something a caller asks for.
impl FromStr for VcsKind {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "git" => Ok(VcsKind::Git),
            "jj" => Ok(VcsKind::Jj),
            other => Err(SessionError::config(format!(
                "unknown VCS type: {other} (expected 'git' or 'jj')"
            ))),
        }
    }
}

/// Capability interface over one VCS command-line tool.
pub trait VcsBackend {
    fn kind(&self) -> VcsKind;

    /// Name of the directory that marks a checkout managed by this backend.
    fn marker(&self) -> &'static str;

    fn detect(&self, dir: &Path) -> bool {
        dir.join(self.marker()).is_dir()
    }

    /// Create an isolated copy of `original_root` at `dest`, keyed by `token`.
    fn create_isolated_copy(&self, original_root: &Path, token: &str, dest: &Path)
        -> Result<PathBuf>;

    /// Best-effort removal. Failures are logged, never returned.
    fn destroy_isolated_copy(&self, original_root: &Path, token: &str, isolated_root: &Path);

    /// Mounts exposing the original repository's metadata store at its original
    /// absolute path, so the tool inside the isolated copy can reach shared history.
    fn metadata_mounts(&self, original_root: &Path, probe: &dyn HostProbe) -> Vec<Mount>;
}

/// Detection order within a single directory: jj first, since colocated jj repos
/// also carry a `.git` directory.
pub fn default_backends() -> Vec<Box<dyn VcsBackend>> {
    vec![Box::new(JjBackend), Box::new(GitBackend)]
}

pub fn backend_for(backends: &[Box<dyn VcsBackend>], kind: VcsKind) -> Option<&dyn VcsBackend> {
    backends
        .iter()
        .map(|b| b.as_ref())
        .find(|b| b.kind() == kind)
}

/// Walk upward from `start` and return the nearest directory claimed by any backend.
pub fn detect<'a>(
    backends: &'a [Box<dyn VcsBackend>],
    start: &Path,
) -> Option<(&'a dyn VcsBackend, PathBuf)> {
    start.ancestors().find_map(|dir| {
        backends
            .iter()
            .find(|b| b.detect(dir))
            .map(|b| (b.as_ref(), dir.to_path_buf()))
    })
}

/// Nearest VCS root above `start`, or `start` itself when none is found.
pub fn find_vcs_root(backends: &[Box<dyn VcsBackend>], start: &Path) -> PathBuf {
    detect(backends, start)
        .map(|(_, root)| root)
        .unwrap_or_else(|| start.to_path_buf())
}

/// Outcome of VCS resolution: the backend (if any) and the repository root.
pub struct Resolved<'a> {
    pub backend: Option<&'a dyn VcsBackend>,
    pub root: PathBuf,
}

impl Resolved<'_> {
    pub fn kind(&self) -> VcsKind {
        self.backend.map(|b| b.kind()).unwrap_or(VcsKind::None)
    }
}

/// Resolve the backend for a session: an explicit kind wins, otherwise auto-detect.
/// With an explicit kind the root is the nearest ancestor carrying that backend's
/// marker, falling back to `start` (the tool will then report the problem itself).
pub fn resolve<'a>(
    backends: &'a [Box<dyn VcsBackend>],
    requested: Option<VcsKind>,
    start: &Path,
) -> Result<Resolved<'a>> {
    match requested {
        None | Some(VcsKind::None) => Ok(match detect(backends, start) {
            Some((backend, root)) => Resolved {
                backend: Some(backend),
                root,
            },
            None => Resolved {
                backend: None,
                root: start.to_path_buf(),
            },
        }),
        Some(kind) => {
            let backend = backend_for(backends, kind).ok_or_else(|| {
                SessionError::config(format!("no backend available for VCS type: {kind}"))
            })?;
            let root = start
                .ancestors()
                .find(|dir| backend.detect(dir))
                .unwrap_or(start)
                .to_path_buf();
            Ok(Resolved {
                backend: Some(backend),
                root,
            })
        }
    }
}

/// Run a VCS tool with captured output. Returns Output on invocation success.
pub(crate) fn vcs_output<I, S>(program: &str, args: I) -> std::io::Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
}

/// Run a VCS tool and map spawn failures or non-zero exits to `VcsCommand`.
pub(crate) fn vcs_checked<S: AsRef<OsStr>>(program: &str, args: &[S]) -> Result<Output> {
    let command = format!("{program} {}", shell_join(args));
    tracing::debug!(%command, "vcs");
    match vcs_output(program, args) {
        Ok(out) if out.status.success() => Ok(out),
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                format!("exited with {}", out.status)
            } else {
                stderr
            };
            Err(SessionError::VcsCommand { command, detail })
        }
        Err(e) => Err(SessionError::VcsCommand {
            command,
            detail: e.to_string(),
        }),
    }
}

/// Cleanup variant of `vcs_checked`: logs the failure and reports success as a bool.
pub(crate) fn vcs_best_effort<S: AsRef<OsStr>>(program: &str, args: &[S]) -> bool {
    match vcs_checked(program, args) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "cleanup command failed");
            crate::warn_print(&format!("cleanup: {e}"));
            false
        }
    }
}
