use std::thread::sleep;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::Command;

use devcontainer::supervise::{exit_code, SignalRelay};

fn raise(sig: Signal) {
    kill(Pid::this(), sig).expect("signal self");
}

async fn wait_pending(relay: &mut SignalRelay) -> Option<Signal> {
    for _ in 0..100 {
        if let Some(sig) = relay.pending().await {
            return Some(sig);
        }
        sleep(Duration::from_millis(10));
    }
    None
}

// Signals go to the whole test process, so every scenario lives in this one test.
#[tokio::test]
async fn test_relay_queues_then_forwards_signals() {
    let mut relay = SignalRelay::install().expect("relay");

    // No child yet: the signal is queued instead of terminating the process
    raise(Signal::SIGINT);
    assert_eq!(wait_pending(&mut relay).await, Some(Signal::SIGINT));
    assert_eq!(relay.pending().await, None);

    // The child exits 0 unless it receives SIGTERM, which its trap turns into 42
    let mut child = Command::new("sh")
        .args([
            "-c",
            "trap 'exit 42' TERM; i=0; while [ $i -lt 100 ]; do sleep 0.1; i=$((i+1)); done; exit 0",
        ])
        .spawn()
        .expect("spawn sh");
    sleep(Duration::from_millis(300));
    raise(Signal::SIGTERM);

    let status = relay.supervise(&mut child).await.expect("wait");
    relay.shutdown().await;
    assert_eq!(exit_code(&status), 42);
}
