/*!
Test support helpers shared across integration tests.

- have_git() / have_jj(): check tool availability on PATH
- jj(dir, args): run jj and capture stdout
- init_repo_with_default_user(dir): initialize a git repo with one commit
- FakeProbe: in-memory host probe for the mount planner
- FakeBackend: VCS backend that counts create/destroy calls
- FakeRuntime: container runtime with scripted build/run outcomes

These helpers do not print skip messages themselves so tests keep their own
"skipping: ..." lines.
*/

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use devcontainer::docker::{BuildRequest, ContainerInfo, ContainerRuntime, RunSpec};
use devcontainer::errors::{Result, SessionError};
use devcontainer::mounts::{HostProbe, Mount};
use devcontainer::vcs::{VcsBackend, VcsKind};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

/// Return true if `git` is available on PATH.
#[allow(dead_code)]
pub fn have_git() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Return true if `jj` is available on PATH.
#[allow(dead_code)]
pub fn have_jj() -> bool {
    Command::new("jj")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run jj in `dir` and return its stdout, or None on failure.
#[allow(dead_code)]
pub fn jj(dir: &Path, args: &[&str]) -> Option<String> {
    let out = Command::new("jj")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).into_owned())
}

#[allow(dead_code)]
pub fn git(dir: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Initialize a git repo with a default identity and one commit.
#[allow(dead_code)]
pub fn init_repo_with_default_user(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let _ = git(dir, &["init", "-q"]);
    let _ = git(dir, &["config", "user.name", "Devcontainer Test"]);
    let _ = git(dir, &["config", "user.email", "devcontainer@example.com"]);
    let _ = git(dir, &["config", "commit.gpgsign", "false"]);
    fs::write(dir.join("README.md"), "hello\n")?;
    if git(dir, &["add", "-A"]) && git(dir, &["commit", "-q", "-m", "init"]) {
        Ok(())
    } else {
        Err(io::Error::other("git commit failed"))
    }
}

/// In-memory host probe.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeProbe {
    pub files: HashSet<PathBuf>,
    pub dirs: HashSet<PathBuf>,
    pub sockets: HashSet<PathBuf>,
    pub contents: HashMap<PathBuf, String>,
    pub groups: HashMap<PathBuf, u32>,
    pub bazel_output_base: Option<PathBuf>,
}

#[allow(dead_code)]
impl FakeProbe {
    pub fn with_file(mut self, p: impl Into<PathBuf>) -> Self {
        self.files.insert(p.into());
        self
    }

    pub fn with_dir(mut self, p: impl Into<PathBuf>) -> Self {
        self.dirs.insert(p.into());
        self
    }

    pub fn with_socket(mut self, p: impl Into<PathBuf>) -> Self {
        self.sockets.insert(p.into());
        self
    }

    pub fn with_contents(mut self, p: impl Into<PathBuf>, s: &str) -> Self {
        let p = p.into();
        self.files.insert(p.clone());
        self.contents.insert(p, s.to_string());
        self
    }
}

impl HostProbe for FakeProbe {
    fn exists(&self, p: &Path) -> bool {
        self.files.contains(p) || self.dirs.contains(p) || self.sockets.contains(p)
    }

    fn is_dir(&self, p: &Path) -> bool {
        self.dirs.contains(p)
    }

    fn is_socket(&self, p: &Path) -> bool {
        self.sockets.contains(p)
    }

    fn read_to_string(&self, p: &Path) -> Option<String> {
        self.contents.get(p).cloned()
    }

    fn group_id(&self, p: &Path) -> Option<u32> {
        self.groups.get(p).copied()
    }

    fn bazel_output_base(&self, _dir: &Path) -> Option<PathBuf> {
        self.bazel_output_base.clone()
    }
}

#[allow(dead_code)]
pub const FAKE_MARKER: &str = ".fakevcs";

/// Backend claiming directories that carry `.fakevcs`. Copies are plain directories.
/// With `raise_on_create` set, creating a copy also sends that signal to this process.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct FakeBackend {
    pub creates: Arc<AtomicUsize>,
    pub destroys: Arc<AtomicUsize>,
    pub raise_on_create: Option<Signal>,
}

#[allow(dead_code)]
impl FakeBackend {
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }
}

impl VcsBackend for FakeBackend {
    fn kind(&self) -> VcsKind {
        VcsKind::Git
    }

    fn marker(&self) -> &'static str {
        FAKE_MARKER
    }

    fn create_isolated_copy(&self, _original_root: &Path, _token: &str, dest: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dest)?;
        self.creates.fetch_add(1, Ordering::SeqCst);
        if let Some(sig) = self.raise_on_create {
            kill(Pid::this(), sig).map_err(io::Error::from)?;
        }
        Ok(dest.to_path_buf())
    }

    fn destroy_isolated_copy(&self, _original_root: &Path, _token: &str, isolated_root: &Path) {
        let _ = fs::remove_dir_all(isolated_root);
        self.destroys.fetch_add(1, Ordering::SeqCst);
    }

    fn metadata_mounts(&self, original_root: &Path, _probe: &dyn HostProbe) -> Vec<Mount> {
        let meta = original_root.join(FAKE_MARKER);
        vec![Mount::rw(&meta, &meta)]
    }
}

/// What the fake runtime's `run` does.
#[allow(dead_code)]
#[derive(Clone, Copy, Debug)]
pub enum RunBehavior {
    /// `run` fails before a process exists.
    LaunchFails,
    /// The container process exits with this code.
    Exits(i32),
}

#[allow(dead_code)]
pub struct FakeRuntime {
    pub build_exit: i32,
    pub run: RunBehavior,
    pub containers: Vec<ContainerInfo>,
    pub builds: RefCell<Vec<BuildRequest>>,
    pub runs: RefCell<Vec<RunSpec>>,
    pub removed: RefCell<Vec<String>>,
    pub execs: RefCell<Vec<String>>,
}

#[allow(dead_code)]
impl FakeRuntime {
    pub fn new(build_exit: i32, run: RunBehavior) -> Self {
        FakeRuntime {
            build_exit,
            run,
            containers: Vec::new(),
            builds: RefCell::new(Vec::new()),
            runs: RefCell::new(Vec::new()),
            removed: RefCell::new(Vec::new()),
            execs: RefCell::new(Vec::new()),
        }
    }
}

#[allow(dead_code)]
pub fn sh_exit(code: i32) -> io::Result<tokio::process::Child> {
    tokio::process::Command::new("sh")
        .args(["-c", &format!("exit {code}")])
        .spawn()
}

impl ContainerRuntime for FakeRuntime {
    fn build(&self, req: &BuildRequest) -> Result<tokio::process::Child> {
        self.builds.borrow_mut().push(req.clone());
        sh_exit(self.build_exit).map_err(|e| SessionError::Build(e.to_string()))
    }

    fn remove_if_exists(&self, name: &str) {
        self.removed.borrow_mut().push(name.to_string());
    }

    fn run(&self, spec: &RunSpec) -> Result<tokio::process::Child> {
        self.runs.borrow_mut().push(spec.clone());
        match self.run {
            RunBehavior::LaunchFails => Err(SessionError::RuntimeLaunch(io::Error::new(
                io::ErrorKind::NotFound,
                "docker: no such file or directory",
            ))),
            RunBehavior::Exits(code) => sh_exit(code).map_err(SessionError::RuntimeLaunch),
        }
    }

    fn list(&self, _filters: &[String]) -> Result<Vec<ContainerInfo>> {
        Ok(self.containers.clone())
    }

    fn exec(&self, name: &str, _tty: bool) -> Result<tokio::process::Child> {
        self.execs.borrow_mut().push(name.to_string());
        sh_exit(0).map_err(SessionError::RuntimeLaunch)
    }
}

#[allow(dead_code)]
pub fn container(id: &str, name: &str) -> ContainerInfo {
    ContainerInfo {
        id: id.to_string(),
        names: name.to_string(),
    }
}
