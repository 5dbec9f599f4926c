//! Child-process supervision: termination signals received by this process are
//! relayed to the supervised child, and the child's exit status becomes ours.

use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::Child;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Conventional shell encoding of death-by-signal: 128 + signal number.
pub const EXIT_CODE_SIGNAL_BASE: i32 = 128;

// Scheduler turns needed for the signal driver to wake the relay task and for
// that task to publish the signal.
const PENDING_DRAIN_ROUNDS: usize = 8;

/// Relays SIGINT and SIGTERM from this process to whichever child is currently
/// supervised.
///
/// Installing the relay replaces the default disposition of both signals, so from
/// that point on they no longer terminate this process. Signals that arrive while
/// no child is supervised stay queued and are reported by [`SignalRelay::pending`].
pub struct SignalRelay {
    rx: mpsc::UnboundedReceiver<Signal>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SignalRelay {
    /// Must be called from within a tokio runtime.
    pub fn install() -> io::Result<Self> {
        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            loop {
                let sig = tokio::select! {
                    _ = &mut stop_rx => break,
                    Some(()) = interrupt.recv() => Signal::SIGINT,
                    Some(()) = terminate.recv() => Signal::SIGTERM,
                    else => break,
                };
                tracing::debug!(signal = ?sig, "received signal");
                if tx.send(sig).is_err() {
                    break;
                }
            }
        });

        Ok(SignalRelay {
            rx,
            stop: Some(stop_tx),
            task: Some(task),
        })
    }

    /// A signal received while no child was being supervised, if any.
    ///
    /// Yields to the runtime first so that signals raised during blocking work
    /// (VCS commands run synchronously) reach the relay task before the check.
    pub async fn pending(&mut self) -> Option<Signal> {
        for _ in 0..PENDING_DRAIN_ROUNDS {
            if let Ok(sig) = self.rx.try_recv() {
                return Some(sig);
            }
            tokio::task::yield_now().await;
        }
        self.rx.try_recv().ok()
    }

    /// Wait for `child` to exit, forwarding relayed signals to it meanwhile.
    ///
    /// The pid is only signalled before `wait` has reaped the child, and nothing
    /// else reaps it, so a forwarded signal never reaches a recycled pid.
    pub async fn supervise(&mut self, child: &mut Child) -> io::Result<ExitStatus> {
        let pid = child.id().map(|id| Pid::from_raw(id as i32));
        loop {
            tokio::select! {
                biased;
                status = child.wait() => return status,
                Some(sig) = self.rx.recv() => {
                    if let Some(pid) = pid {
                        forward(pid, sig);
                    }
                }
            }
        }
    }

    /// Stop the relay task and wait for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SignalRelay {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn forward(pid: Pid, sig: Signal) {
    tracing::debug!(pid = pid.as_raw(), signal = ?sig, "forwarding signal to child");
    if let Err(e) = kill(pid, sig) {
        tracing::debug!(pid = pid.as_raw(), error = %e, "signal forward failed");
    }
}

/// Exit code to report for a finished child: its own code, or 128+signal when it
/// was killed by a signal.
pub fn exit_code(status: &ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|s| EXIT_CODE_SIGNAL_BASE + s))
        .unwrap_or(1)
}
