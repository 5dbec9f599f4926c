#![allow(clippy::module_name_repetitions)]
//! Mount planning for a session container.
//!
//! The plan is a deterministic, ordered list of bind mounts plus environment and
//! generated files. Entries are either unconditional (workspace, toolchain caches,
//! assistant state) or gated by a host probe (file/dir/socket exists).

mod probe;

pub use probe::{HostFs, HostProbe};

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::session::Session;
use crate::vcs::VcsBackend;

pub const CONTAINER_HOME: &str = "/home/dev";
pub const CONTAINER_WORKSPACE: &str = "/workspace";
pub const DOCKER_SOCKET: &str = "/var/run/docker.sock";
pub const SSH_AGENT_SOCKET: &str = "/tmp/ssh-agent.sock";
pub const BAZEL_MANIFEST: &str = "MODULE.bazel";
pub const BAZEL_RC: &str = "/etc/bazel.bazelrc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub host: PathBuf,
    pub container: PathBuf,
    pub read_only: bool,
}

impl Mount {
    pub fn rw(host: impl Into<PathBuf>, container: impl Into<PathBuf>) -> Self {
        Mount {
            host: host.into(),
            container: container.into(),
            read_only: false,
        }
    }

    pub fn ro(host: impl Into<PathBuf>, container: impl Into<PathBuf>) -> Self {
        Mount {
            host: host.into(),
            container: container.into(),
            read_only: true,
        }
    }

    /// `host:container[:ro]` as passed to `docker run -v`.
    pub fn volume_spec(&self) -> OsString {
        let mut s = OsString::from(self.host.as_os_str());
        s.push(":");
        s.push(self.container.as_os_str());
        if self.read_only {
            s.push(":ro");
        }
        s
    }
}

/// A file whose contents are produced by the planner and mounted read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub container: PathBuf,
    pub contents: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountPlan {
    pub mounts: Vec<Mount>,
    pub env: Vec<(String, String)>,
    pub files: Vec<GeneratedFile>,
}

impl MountPlan {
    fn push(&mut self, m: Mount) {
        self.mounts.push(m);
    }

    pub fn contains_container_path(&self, container: &Path) -> bool {
        self.mounts.iter().any(|m| m.container == container)
    }
}

/// Session-level switches for conditional mounts.
pub struct MountOptions<'a> {
    pub host_home: &'a Path,
    /// Mount the docker control socket (only honored when it is a socket).
    pub docker_socket: bool,
    pub ssh_auth_sock: Option<&'a Path>,
}

fn home_path(rel: &str) -> PathBuf {
    Path::new(CONTAINER_HOME).join(rel)
}

/// Build the mount plan for `session`. `backend` is the backend owning the isolated
/// copy; its metadata mounts are mandatory whenever an isolated copy exists.
pub fn plan(
    session: &Session,
    backend: Option<&dyn VcsBackend>,
    opts: &MountOptions<'_>,
    probe: &dyn HostProbe,
) -> MountPlan {
    let home = opts.host_home;
    let mut plan = MountPlan::default();

    plan.push(Mount::rw(&session.isolated_root, CONTAINER_WORKSPACE));

    // Toolchain caches and assistant state
    for (rel, ro) in [
        (".cache/bazelisk", true),
        (".cargo", true),
        (".rustup", true),
        ("go", true),
    ] {
        plan.push(Mount {
            host: home.join(rel),
            container: home_path(rel),
            read_only: ro,
        });
    }
    plan.push(Mount::rw(home.join("dev/go"), home_path("gopath")));
    plan.push(Mount::ro(home.join(".npm"), home_path(".npm")));
    plan.push(Mount::ro(home.join(".cache/pnpm"), home_path(".cache/pnpm")));
    plan.push(Mount::rw(home.join(".claude"), home_path(".claude")));
    plan.push(Mount::rw(home.join(".claude.json"), home_path(".claude.json")));

    // The manifest lives at the repository root, so probe the original checkout
    let source_root = session.source_root();
    if probe.exists(&source_root.join(BAZEL_MANIFEST)) {
        match probe.bazel_output_base(source_root) {
            Some(base) => {
                plan.push(Mount::rw(&base, &base));
                plan.files.push(GeneratedFile {
                    container: PathBuf::from(BAZEL_RC),
                    contents: format!("startup --output_base={}\n", base.display()),
                });
            }
            None => tracing::debug!("bazel output base unavailable; skipping cache mount"),
        }
    }

    let docker_sock = Path::new(DOCKER_SOCKET);
    if opts.docker_socket {
        if probe.is_socket(docker_sock) {
            plan.push(Mount::rw(docker_sock, docker_sock));
        } else {
            crate::warn_print(&format!(
                "--docker requested but {} is not a socket; skipping",
                DOCKER_SOCKET
            ));
        }
    }

    let gitconfig = home.join(".gitconfig");
    if probe.exists(&gitconfig) {
        plan.push(Mount::ro(gitconfig, home_path(".gitconfig")));
    }
    for rel in [".config/gh", ".config/jj", ".ssh"] {
        let p = home.join(rel);
        if probe.is_dir(&p) {
            plan.push(Mount::ro(p, home_path(rel)));
        }
    }

    if let Some(sock) = opts.ssh_auth_sock {
        plan.push(Mount::rw(sock, SSH_AGENT_SOCKET));
        plan.env
            .push(("SSH_AUTH_SOCK".to_string(), SSH_AGENT_SOCKET.to_string()));
    }

    if let (Some(backend), Some(original)) = (backend, session.original_root.as_deref()) {
        for m in backend.metadata_mounts(original, probe) {
            plan.push(m);
        }
    }

    plan
}
