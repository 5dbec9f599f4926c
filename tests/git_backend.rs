mod support;

use std::fs;
use std::process::Command;

use devcontainer::session::IsolatedCopy;
use devcontainer::vcs::{GitBackend, VcsBackend};
use support::{git, have_git, init_repo_with_default_user};

fn branch_exists(repo: &std::path::Path, branch: &str) -> bool {
    Command::new("git")
        .args(["rev-parse", "--verify", "--quiet", &format!("refs/heads/{branch}")])
        .current_dir(repo)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[test]
fn test_branch_at_tip_is_deleted() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let td = tempfile::tempdir().expect("tmpdir");
    let repo = td.path().join("repo");
    init_repo_with_default_user(&repo).expect("init repo");
    let dest = td.path().join("devcontainer-tip");

    let copy = IsolatedCopy::acquire(&GitBackend, &repo, "devcontainer-tip", &dest)
        .expect("worktree add");
    assert!(dest.join("README.md").exists());
    assert!(branch_exists(&repo, "devcontainer-tip"));

    copy.release();
    assert!(!dest.exists(), "worktree directory should be removed");
    assert!(
        !branch_exists(&repo, "devcontainer-tip"),
        "merged branch should be deleted"
    );
}

#[test]
fn test_unmerged_branch_is_kept() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let td = tempfile::tempdir().expect("tmpdir");
    let repo = td.path().join("repo");
    init_repo_with_default_user(&repo).expect("init repo");
    let dest = td.path().join("devcontainer-work");

    {
        let copy = IsolatedCopy::acquire(&GitBackend, &repo, "devcontainer-work", &dest)
            .expect("worktree add");
        fs::write(copy.path().join("new.txt"), "work\n").unwrap();
        assert!(git(copy.path(), &["add", "-A"]));
        assert!(git(copy.path(), &["commit", "-q", "-m", "session work"]));
        // dropped here without an explicit release
    }

    assert!(!dest.exists(), "worktree directory should be removed on drop");
    assert!(
        branch_exists(&repo, "devcontainer-work"),
        "unmerged branch must survive cleanup"
    );
    assert!(!GitBackend.branch_is_merged(&repo, "devcontainer-work"));
}

#[test]
fn test_create_failure_reports_command() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let td = tempfile::tempdir().expect("tmpdir");
    let not_a_repo = td.path().join("plain");
    fs::create_dir_all(&not_a_repo).unwrap();
    let err = GitBackend
        .create_isolated_copy(&not_a_repo, "devcontainer-x", &td.path().join("dest"))
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("git -C"), "unexpected error: {msg}");
}

#[test]
fn test_metadata_mount_is_git_dir() {
    let probe = support::FakeProbe::default();
    let mounts = GitBackend.metadata_mounts(std::path::Path::new("/r"), &probe);
    assert_eq!(mounts.len(), 1);
    assert_eq!(mounts[0].host, std::path::PathBuf::from("/r/.git"));
    assert_eq!(mounts[0].container, std::path::PathBuf::from("/r/.git"));
}
