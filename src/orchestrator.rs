//! Session lifecycle for `start`.
//!
//! Init → VcsResolved → [IsolatedCopyCreated] → ImageReady → Running → Exited → CleanedUp.
//! The isolated copy is owned by an `IsolatedCopy` guard for the whole run, so every
//! exit path after creation (build failure, launch failure, child exit, interruption)
//! destroys it exactly once.

use std::cell::Cell;
use std::fs;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::config::StartConfig;
use crate::docker::{BuildRequest, ContainerRuntime, RunSpec};
use crate::errors::{Result, SessionError};
use crate::mounts::{self, HostProbe, Mount, MountOptions, MountPlan, DOCKER_SOCKET};
use crate::session::{choose_name, prefixed, IsolatedCopy, Session, WORKSPACE_LABEL};
use crate::supervise::{self, SignalRelay};
use crate::trust;
use crate::vcs::{self, VcsBackend};

const DOCKERFILE: &[u8] = include_bytes!("../assets/Dockerfile");
const DOCKERIGNORE: &[u8] = include_bytes!("../assets/dockerignore");

/// Group id passed as DOCKER_GID when the host has no docker socket to read it from.
pub const DEFAULT_DOCKER_GID: u32 = 984;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Init,
    VcsResolved,
    IsolatedCopyCreated,
    ImageReady,
    Running,
    Exited,
    CleanedUp,
}

/// How a session ended when the harness itself did not fail.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    Success,
    /// The container process exited non-zero (128+signal when it was killed).
    ChildExited(i32),
}

impl SessionOutcome {
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            SessionOutcome::Success
        } else {
            SessionOutcome::ChildExited(code)
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            SessionOutcome::Success => 0,
            SessionOutcome::ChildExited(code) => crate::errors::exit_code_for_child(*code),
        }
    }
}

pub struct Orchestrator<'a> {
    runtime: &'a dyn ContainerRuntime,
    probe: &'a dyn HostProbe,
    backends: Vec<Box<dyn VcsBackend>>,
    state: Cell<SessionState>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(runtime: &'a dyn ContainerRuntime, probe: &'a dyn HostProbe) -> Self {
        Self::with_backends(runtime, probe, vcs::default_backends())
    }

    pub fn with_backends(
        runtime: &'a dyn ContainerRuntime,
        probe: &'a dyn HostProbe,
        backends: Vec<Box<dyn VcsBackend>>,
    ) -> Self {
        Orchestrator {
            runtime,
            probe,
            backends,
            state: Cell::new(SessionState::Init),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    fn transition(&self, next: SessionState) {
        let prev = self.state.replace(next);
        tracing::info!(from = ?prev, to = ?next, "session state");
    }

    /// Run one session to completion. Must be called from within a tokio runtime.
    pub async fn start(&self, cfg: &StartConfig) -> Result<SessionOutcome> {
        let mut relay = SignalRelay::install()?;
        let outcome = self.start_with_relay(cfg, &mut relay).await;
        relay.shutdown().await;
        outcome
    }

    async fn start_with_relay(
        &self,
        cfg: &StartConfig,
        relay: &mut SignalRelay,
    ) -> Result<SessionOutcome> {
        let resolved = vcs::resolve(&self.backends, cfg.vcs, &cfg.start_dir)?;
        self.transition(SessionState::VcsResolved);
        tracing::info!(vcs = %resolved.kind(), root = %resolved.root.display(), "vcs resolved");

        let Some(backend) = resolved.backend else {
            let session = Session::direct(
                &resolved.root,
                cfg.name.as_deref(),
                &cfg.default_container_name,
            );
            let outcome = self.run_session(cfg, &session, None, relay).await;
            self.transition(SessionState::CleanedUp);
            return outcome;
        };

        let name = choose_name(cfg.name.as_deref(), &cfg.host.scratch_dir)?;
        let token = prefixed(&name);
        let dest = cfg.host.scratch_dir.join(&token);
        let copy = IsolatedCopy::acquire(backend, &resolved.root, &token, &dest)?;
        self.transition(SessionState::IsolatedCopyCreated);

        let session = Session::isolated(&name, backend.kind(), &resolved.root, &copy);
        let outcome = self.run_session(cfg, &session, Some(copy.backend()), relay).await;

        copy.release();
        self.transition(SessionState::CleanedUp);
        outcome
    }

    async fn run_session(
        &self,
        cfg: &StartConfig,
        session: &Session,
        backend: Option<&dyn VcsBackend>,
        relay: &mut SignalRelay,
    ) -> Result<SessionOutcome> {
        check_interrupted(relay).await?;
        self.build_image(cfg, relay).await?;
        self.transition(SessionState::ImageReady);
        check_interrupted(relay).await?;

        self.runtime.remove_if_exists(&session.container_name);

        let state_file = cfg.host.home.join(".claude.json");
        match trust::trust_workspace(&state_file) {
            Ok(true) => tracing::debug!(path = %state_file.display(), "workspace marked trusted"),
            Ok(false) => tracing::debug!(path = %state_file.display(), "no assistant state file"),
            Err(e) => crate::warn_print(&format!(
                "could not mark workspace trusted in {}: {}",
                state_file.display(),
                e
            )),
        }

        let plan = mounts::plan(
            session,
            backend,
            &MountOptions {
                host_home: &cfg.host.home,
                docker_socket: cfg.docker_socket,
                ssh_auth_sock: cfg.ssh_auth_sock.as_deref(),
            },
            self.probe,
        );
        // Generated files must outlive the container
        let (mounts, _generated) = materialize(&plan)?;

        let spec = RunSpec {
            name: session.container_name.clone(),
            image: cfg.image_name.clone(),
            labels: vec![(
                WORKSPACE_LABEL.to_string(),
                session.source_root().display().to_string(),
            )],
            mounts,
            env: plan.env.clone(),
            ports: cfg.ports.clone(),
            tty: cfg.host.stdin_tty,
            command: cfg.command.argv(),
        };
        let mut child = self.runtime.run(&spec)?;
        self.transition(SessionState::Running);

        let status = relay.supervise(&mut child).await?;
        let code = supervise::exit_code(&status);
        self.transition(SessionState::Exited);
        tracing::info!(container = %session.container_name, code, "container exited");
        Ok(SessionOutcome::from_code(code))
    }

    async fn build_image(&self, cfg: &StartConfig, relay: &mut SignalRelay) -> Result<()> {
        let context = tempfile::Builder::new()
            .prefix("devcontainer-build-")
            .tempdir()?;
        fs::write(context.path().join("Dockerfile"), DOCKERFILE)?;
        fs::write(context.path().join(".dockerignore"), DOCKERIGNORE)?;

        let docker_gid = self
            .probe
            .group_id(Path::new(DOCKER_SOCKET))
            .unwrap_or(DEFAULT_DOCKER_GID);
        let req = BuildRequest {
            context_dir: context.path().to_path_buf(),
            tag: cfg.image_name.clone(),
            build_args: vec![
                ("USER_UID".to_string(), cfg.host.uid.to_string()),
                ("USER_GID".to_string(), cfg.host.gid.to_string()),
                ("DOCKER_GID".to_string(), docker_gid.to_string()),
            ],
        };

        let mut child = self.runtime.build(&req)?;
        let status = relay
            .supervise(&mut child)
            .await
            .map_err(|e| SessionError::Build(e.to_string()))?;
        if !status.success() {
            return Err(SessionError::Build(format!("exited with {status}")));
        }
        Ok(())
    }
}

async fn check_interrupted(relay: &mut SignalRelay) -> Result<()> {
    match relay.pending().await {
        Some(sig) => Err(SessionError::Interrupted(sig as i32)),
        None => Ok(()),
    }
}

/// Write generated files to host temp files and append read-only mounts for them.
/// The returned handles keep the files alive.
fn materialize(plan: &MountPlan) -> Result<(Vec<Mount>, Vec<NamedTempFile>)> {
    let mut mounts = plan.mounts.clone();
    let mut handles = Vec::with_capacity(plan.files.len());
    for f in &plan.files {
        let tmp = tempfile::Builder::new()
            .prefix("devcontainer-gen-")
            .tempfile()?;
        fs::write(tmp.path(), &f.contents)?;
        mounts.push(Mount::ro(tmp.path(), &f.container));
        handles.push(tmp);
    }
    Ok((mounts, handles))
}
