#![allow(clippy::module_name_repetitions)]
//! Container runtime client.
//!
//! `ContainerRuntime` is the seam between the orchestrator and the docker CLI.
//! Process-spawning operations return a `tokio::process::Child` so the caller can
//! supervise it (signal forwarding, exit status) the same way for build, run and exec.

mod flags;
mod run;
mod runtime;

pub use run::RunSpec;
pub use runtime::container_runtime_path;

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command as StdCommand, Stdio};

use serde::Deserialize;
use tokio::process::{Child, Command};

use crate::errors::{Result, SessionError};
use crate::util::shell_join;

/// One row of `docker ps --format '{{json .}}'`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerInfo {
    #[serde(rename = "ID")]
    pub id: String,
    /// Comma-separated container names, as docker reports them.
    #[serde(rename = "Names")]
    pub names: String,
}

impl ContainerInfo {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.split(',').map(str::trim).filter(|n| !n.is_empty())
    }

    /// The name used to address the container.
    pub fn primary_name(&self) -> &str {
        self.names().next().unwrap_or(&self.id)
    }
}

/// Parse `docker ps` JSON lines, skipping anything malformed.
pub fn parse_ps_lines(out: &str) -> Vec<ContainerInfo> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|l| match serde_json::from_str::<ContainerInfo>(l) {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::debug!(line = l, error = %e, "skipping malformed docker ps line");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub context_dir: PathBuf,
    pub tag: String,
    pub build_args: Vec<(String, String)>,
}

impl BuildRequest {
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("build"),
            OsString::from("-t"),
            OsString::from(&self.tag),
        ];
        for (k, v) in &self.build_args {
            flags::push_build_arg(&mut args, k, v);
        }
        args.push(self.context_dir.clone().into_os_string());
        args
    }
}

pub trait ContainerRuntime {
    /// Start an image build. The caller waits on the child; a non-zero exit is a
    /// build failure.
    fn build(&self, req: &BuildRequest) -> Result<Child>;

    /// Force-remove a container by name. Idempotent; errors are swallowed.
    fn remove_if_exists(&self, name: &str);

    fn run(&self, spec: &RunSpec) -> Result<Child>;

    /// Running containers matching any of the given `docker ps` filters.
    fn list(&self, filters: &[String]) -> Result<Vec<ContainerInfo>>;

    /// `docker exec -i [-t] <name> bash`.
    fn exec(&self, name: &str, tty: bool) -> Result<Child>;
}

/// `ContainerRuntime` over the docker command-line client.
pub struct DockerCli {
    runtime: PathBuf,
    verbose: bool,
}

impl DockerCli {
    pub fn new(verbose: bool) -> std::io::Result<Self> {
        Ok(DockerCli {
            runtime: container_runtime_path()?,
            verbose,
        })
    }

    fn preview(&self, args: &[OsString]) {
        let preview = format!("docker {}", shell_join(args));
        tracing::debug!(command = %preview, "docker");
        if self.verbose {
            eprintln!("devcontainer: docker: {preview}");
        }
    }

    /// Spawn docker with inherited stdio.
    fn spawn(&self, args: &[OsString]) -> std::io::Result<Child> {
        self.preview(args);
        Command::new(&self.runtime).args(args).spawn()
    }
}

impl ContainerRuntime for DockerCli {
    fn build(&self, req: &BuildRequest) -> Result<Child> {
        self.spawn(&req.to_args())
            .map_err(|e| SessionError::Build(e.to_string()))
    }

    fn remove_if_exists(&self, name: &str) {
        let args = [OsString::from("rm"), OsString::from("-f"), OsString::from(name)];
        self.preview(&args);
        let res = StdCommand::new(&self.runtime)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(e) = res {
            tracing::debug!(container = name, error = %e, "docker rm -f failed");
        }
    }

    fn run(&self, spec: &RunSpec) -> Result<Child> {
        self.spawn(&spec.to_args()).map_err(SessionError::RuntimeLaunch)
    }

    fn list(&self, filters: &[String]) -> Result<Vec<ContainerInfo>> {
        let mut args = vec![OsString::from("ps")];
        for f in filters {
            args.push(OsString::from("--filter"));
            args.push(OsString::from(f));
        }
        args.push(OsString::from("--format"));
        args.push(OsString::from("{{json .}}"));
        self.preview(&args);
        let out = StdCommand::new(&self.runtime)
            .args(&args)
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(SessionError::RuntimeLaunch)?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(SessionError::RuntimeLaunch(std::io::Error::other(format!(
                "docker ps failed: {stderr}"
            ))));
        }
        Ok(parse_ps_lines(&String::from_utf8_lossy(&out.stdout)))
    }

    fn exec(&self, name: &str, tty: bool) -> Result<Child> {
        let mut args = vec![OsString::from("exec")];
        args.extend(flags::tty_flags(tty));
        args.push(OsString::from(name));
        args.push(OsString::from("bash"));
        self.spawn(&args).map_err(SessionError::RuntimeLaunch)
    }
}
