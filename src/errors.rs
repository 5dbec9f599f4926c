//! Error mapping guide:
//! - Harness failures exit 1, including a missing or unstartable docker binary.
//! - Interrupted sessions exit 128 + signal, like a child killed by that signal.
//! - Config errors are raised before any side effect (no worktree, no build).
//! - A non-zero child exit is not an error; it is reported through `SessionOutcome`.
use std::io;

use thiserror::Error;

/// Failures of the harness itself, as opposed to the supervised container process.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Invalid flag combination or malformed input.
    #[error("{0}")]
    Config(String),

    /// The VCS tool failed while creating the isolated copy.
    #[error("{command}: {detail}")]
    VcsCommand { command: String, detail: String },

    /// The image build failed.
    #[error("docker build: {0}")]
    Build(String),

    /// The container engine could not start the process.
    #[error("starting docker")]
    RuntimeLaunch(#[source] io::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("multiple devcontainers running; specify a name or run interactively")]
    AmbiguousTarget,

    /// A termination signal arrived while no container process was running.
    #[error("interrupted by signal {0}")]
    Interrupted(i32),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;

impl SessionError {
    pub fn config(msg: impl Into<String>) -> Self {
        SessionError::Config(msg.into())
    }
}

/// Convert SessionError to a process exit code.
pub fn exit_code_for_session_error(e: &SessionError) -> u8 {
    match e {
        SessionError::Interrupted(sig) => exit_code_for_child(128 + sig),
        _ => 1,
    }
}

/// Fold a child exit code into the 0..=255 process exit range.
/// Codes outside that range still report failure.
pub fn exit_code_for_child(code: i32) -> u8 {
    match u8::try_from(code) {
        Ok(c) => c,
        Err(_) => 1,
    }
}
