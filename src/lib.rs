#![allow(clippy::module_name_repetitions)]
//! Ephemeral Claude devcontainers bound to per-session VCS working copies.
//!
//! `start` resolves the repository's VCS, creates an isolated copy (git worktree
//! or jj workspace) owned by a scoped guard, builds the image, plans bind mounts
//! and supervises `docker run`. `exec` attaches a shell to a running session.

pub mod attach;
pub mod color;
pub mod config;
pub mod docker;
pub mod errors;
pub mod mounts;
pub mod orchestrator;
pub mod session;
pub mod supervise;
pub mod telemetry;
pub mod trust;
pub mod ui;
pub mod util;
pub mod vcs;

pub use attach::{list_filters, Prompter};
pub use color::{
    color_enabled_stderr, log_error_stderr, log_info_stderr, log_warn_stderr, paint,
    set_color_mode, warn_print, ColorMode,
};
pub use config::{EnvSnapshot, ExecConfig, HostContext, LaunchCommand, PortMapping, StartConfig, StartOptions};
pub use docker::{ContainerInfo, ContainerRuntime, DockerCli, RunSpec};
pub use errors::{
    exit_code_for_child, exit_code_for_session_error, SessionError,
};
pub use orchestrator::{Orchestrator, SessionOutcome, SessionState};
pub use session::{IsolatedCopy, Session};
pub use telemetry::telemetry_init;
pub use util::{shell_escape, shell_join};
pub use vcs::{VcsBackend, VcsKind};
