//! Invocation configuration, assembled once at entry from flags and a snapshot of
//! the environment. Core logic reads only these structs, never the environment.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::{Result, SessionError};
use crate::vcs::{self, VcsBackend, VcsKind};

pub const DEFAULT_CONTAINER_NAME: &str = "claude-dev";
pub const DEFAULT_IMAGE_NAME: &str = "claude-devcontainer";

/// Environment values consumed by the tool, captured once.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    pub container_name: Option<String>,
    pub image_name: Option<String>,
    pub vcs: Option<String>,
    pub ssh_auth_sock: Option<PathBuf>,
    pub build_workspace_directory: Option<PathBuf>,
    pub log_filter: Option<String>,
    pub color: Option<String>,
    pub no_color: bool,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl EnvSnapshot {
    pub fn capture() -> Self {
        EnvSnapshot {
            container_name: non_empty_var("CONTAINER_NAME"),
            image_name: non_empty_var("IMAGE_NAME"),
            vcs: non_empty_var("DEVCONTAINER_VCS"),
            ssh_auth_sock: non_empty_var("SSH_AUTH_SOCK").map(PathBuf::from),
            build_workspace_directory: non_empty_var("BUILD_WORKSPACE_DIRECTORY").map(PathBuf::from),
            log_filter: non_empty_var("DEVCONTAINER_LOG").or_else(|| non_empty_var("RUST_LOG")),
            color: non_empty_var("DEVCONTAINER_COLOR"),
            no_color: env::var_os("NO_COLOR").is_some(),
        }
    }

    pub fn default_container_name(&self) -> String {
        self.container_name
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTAINER_NAME.to_string())
    }

    /// Directory to start VCS discovery from: the build tool's workspace when set,
    /// otherwise the current directory.
    pub fn start_dir(&self, cwd: &Path) -> PathBuf {
        self.build_workspace_directory
            .clone()
            .unwrap_or_else(|| cwd.to_path_buf())
    }
}

/// `hostPort:containerPort`, validated and passed to docker unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    raw: String,
    pub host: u16,
    pub container: u16,
}

impl PortMapping {
    pub fn parse(s: &str) -> Result<Self> {
        let (host, container) = s.split_once(':').ok_or_else(|| {
            SessionError::config(format!(
                "invalid port format {s:?}: expected hostPort:containerPort"
            ))
        })?;
        let host = host.parse::<u16>().map_err(|e| {
            SessionError::config(format!("invalid host port in {s:?}: {e}"))
        })?;
        let container = container.parse::<u16>().map_err(|e| {
            SessionError::config(format!("invalid container port in {s:?}: {e}"))
        })?;
        Ok(PortMapping {
            raw: s.to_string(),
            host,
            container,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// What the container runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchCommand {
    /// The image's default command.
    Default,
    /// Resume an assistant conversation, optionally by id (otherwise the picker).
    Resume(Option<String>),
    Custom(Vec<String>),
}

impl LaunchCommand {
    pub fn argv(&self) -> Vec<String> {
        match self {
            LaunchCommand::Default => Vec::new(),
            LaunchCommand::Resume(id) => {
                let mut v = vec![
                    "claude".to_string(),
                    "--dangerously-skip-permissions".to_string(),
                    "--resume".to_string(),
                ];
                v.extend(id.iter().cloned());
                v
            }
            LaunchCommand::Custom(args) => args.clone(),
        }
    }
}

/// Raw `start` flags, before validation.
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub name: Option<String>,
    pub vcs: Option<String>,
    pub docker: bool,
    pub ports: Vec<String>,
    /// `None`: flag absent. `Some(None)`: `--resume` without an id.
    pub resume: Option<Option<String>>,
    pub command: Vec<String>,
}

/// Host facts gathered at entry.
#[derive(Debug, Clone)]
pub struct HostContext {
    pub cwd: PathBuf,
    pub home: PathBuf,
    pub scratch_dir: PathBuf,
    pub uid: u32,
    pub gid: u32,
    pub stdin_tty: bool,
}

#[derive(Debug, Clone)]
pub struct StartConfig {
    pub name: Option<String>,
    /// Explicit VCS choice (flag, then DEVCONTAINER_VCS); `None` means auto-detect.
    pub vcs: Option<VcsKind>,
    pub docker_socket: bool,
    pub ports: Vec<PortMapping>,
    pub command: LaunchCommand,
    pub default_container_name: String,
    pub image_name: String,
    pub start_dir: PathBuf,
    pub ssh_auth_sock: Option<PathBuf>,
    pub host: HostContext,
}

impl StartConfig {
    /// Validate flags and merge them with the environment. Performs no side effects.
    pub fn new(opts: StartOptions, env: &EnvSnapshot, host: HostContext) -> Result<Self> {
        if opts.resume.is_some() && !opts.command.is_empty() {
            return Err(SessionError::config(
                "cannot combine --resume with extra command arguments",
            ));
        }

        let ports = opts
            .ports
            .iter()
            .map(|p| PortMapping::parse(p))
            .collect::<Result<Vec<_>>>()?;

        let vcs = opts
            .vcs
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .or(env.vcs.as_deref())
            .map(str::parse::<VcsKind>)
            .transpose()?;

        let name = match opts.name.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(n) => {
                validate_name(n)?;
                Some(n.to_string())
            }
        };

        let command = match opts.resume {
            Some(id) => LaunchCommand::Resume(id.filter(|s| !s.trim().is_empty())),
            None if opts.command.is_empty() => LaunchCommand::Default,
            None => LaunchCommand::Custom(opts.command),
        };

        Ok(StartConfig {
            name,
            vcs,
            docker_socket: opts.docker,
            ports,
            command,
            default_container_name: env.default_container_name(),
            image_name: env
                .image_name
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE_NAME.to_string()),
            start_dir: env.start_dir(&host.cwd),
            ssh_auth_sock: env.ssh_auth_sock.clone(),
            host,
        })
    }
}

/// Names end up in a directory, a branch and a container name.
fn validate_name(n: &str) -> Result<()> {
    let ok = n
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        && !n.starts_with(['-', '.']);
    if ok {
        Ok(())
    } else {
        Err(SessionError::config(format!(
            "invalid --name {n:?}: use letters, digits, '-', '_' or '.'"
        )))
    }
}

#[derive(Debug, Clone)]
pub struct ExecConfig {
    pub target: Option<String>,
    pub start_dir: PathBuf,
    pub default_container_name: String,
    pub stdin_tty: bool,
}

impl ExecConfig {
    pub fn new(target: Option<String>, env: &EnvSnapshot, cwd: &Path, stdin_tty: bool) -> Self {
        ExecConfig {
            target: target.filter(|t| !t.trim().is_empty()),
            start_dir: env.start_dir(cwd),
            default_container_name: env.default_container_name(),
            stdin_tty,
        }
    }

    /// Repository whose containers are listed. Discovery starts where `start` starts
    /// it, so the root matches the workspace label `start` put on its container.
    pub fn workspace_root(&self, backends: &[Box<dyn VcsBackend>]) -> PathBuf {
        vcs::find_vcs_root(backends, &self.start_dir)
    }
}
