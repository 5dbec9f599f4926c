mod support;

use std::fs;
use std::path::Path;

use devcontainer::errors::SessionError;
use devcontainer::session::IsolatedCopy;
use devcontainer::vcs::{JjBackend, VcsBackend};
use support::{have_jj, jj};

fn init_jj_repo(dir: &Path) -> bool {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("README.md"), "hello\n").unwrap();
    jj(dir, &["git", "init"]).is_some()
}

fn workspace_names(repo: &Path) -> Vec<String> {
    jj(repo, &["workspace", "list"])
        .unwrap_or_default()
        .lines()
        .filter_map(|l| l.split_once(':').map(|(name, _)| name.trim().to_string()))
        .collect()
}

#[test]
fn test_workspace_is_forgotten_and_removed_on_release() {
    if !have_jj() {
        eprintln!("skipping: jj not found in PATH");
        return;
    }
    let td = tempfile::tempdir().expect("tmpdir");
    let repo = td.path().join("repo");
    if !init_jj_repo(&repo) {
        eprintln!("skipping: jj git init failed");
        return;
    }
    let dest = td.path().join("devcontainer-ws");

    let copy = IsolatedCopy::acquire(&JjBackend, &repo, "devcontainer-ws", &dest)
        .expect("workspace add");
    assert!(dest.join(".jj").is_dir(), "workspace checkout should exist");
    assert!(workspace_names(&repo).contains(&"devcontainer-ws".to_string()));

    copy.release();
    assert!(!dest.exists(), "workspace directory should be removed");
    assert!(
        !workspace_names(&repo).contains(&"devcontainer-ws".to_string()),
        "workspace should be forgotten"
    );
    assert!(workspace_names(&repo).contains(&"default".to_string()));
}

#[test]
fn test_workspace_dropped_without_release_is_cleaned() {
    if !have_jj() {
        eprintln!("skipping: jj not found in PATH");
        return;
    }
    let td = tempfile::tempdir().expect("tmpdir");
    let repo = td.path().join("repo");
    if !init_jj_repo(&repo) {
        eprintln!("skipping: jj git init failed");
        return;
    }
    let dest = td.path().join("devcontainer-drop");

    {
        let _copy = IsolatedCopy::acquire(&JjBackend, &repo, "devcontainer-drop", &dest)
            .expect("workspace add");
    }

    assert!(!dest.exists());
    assert!(!workspace_names(&repo).contains(&"devcontainer-drop".to_string()));
}

#[test]
fn test_create_failure_reports_command() {
    if !have_jj() {
        eprintln!("skipping: jj not found in PATH");
        return;
    }
    let td = tempfile::tempdir().expect("tmpdir");
    let not_a_repo = td.path().join("plain");
    fs::create_dir_all(&not_a_repo).unwrap();

    let err = JjBackend
        .create_isolated_copy(&not_a_repo, "devcontainer-x", &td.path().join("dest"))
        .unwrap_err();
    match &err {
        SessionError::VcsCommand { command, detail } => {
            assert!(command.starts_with("jj -R"), "unexpected command: {command}");
            assert!(command.contains("workspace add"), "unexpected command: {command}");
            assert!(!detail.is_empty());
        }
        other => panic!("expected VcsCommand, got {other:?}"),
    }
    assert!(!td.path().join("dest").exists());
}
