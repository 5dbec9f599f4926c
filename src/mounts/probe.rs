#![allow(clippy::module_name_repetitions)]
//! Host filesystem probes consulted by the mount planner.

use std::fs;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub trait HostProbe {
    fn exists(&self, p: &Path) -> bool;
    fn is_dir(&self, p: &Path) -> bool;
    fn is_socket(&self, p: &Path) -> bool;
    fn read_to_string(&self, p: &Path) -> Option<String>;

    /// Owning group of a file (used for the docker control socket).
    fn group_id(&self, p: &Path) -> Option<u32>;

    /// Bazel output base for the workspace at `dir`, if bazel can report one.
    fn bazel_output_base(&self, dir: &Path) -> Option<PathBuf>;
}

/// Probes backed by the real host filesystem.
pub struct HostFs;

impl HostProbe for HostFs {
    fn exists(&self, p: &Path) -> bool {
        fs::metadata(p).is_ok()
    }

    fn is_dir(&self, p: &Path) -> bool {
        p.is_dir()
    }

    fn is_socket(&self, p: &Path) -> bool {
        fs::metadata(p)
            .map(|m| m.file_type().is_socket())
            .unwrap_or(false)
    }

    fn read_to_string(&self, p: &Path) -> Option<String> {
        fs::read_to_string(p).ok()
    }

    fn group_id(&self, p: &Path) -> Option<u32> {
        fs::metadata(p).ok().map(|m| m.gid())
    }

    fn bazel_output_base(&self, dir: &Path) -> Option<PathBuf> {
        let out = Command::new("bazel")
            .args(["info", "output_base"])
            .current_dir(dir)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()?;
        if !out.status.success() {
            tracing::debug!(status = %out.status, "bazel info output_base failed");
            return None;
        }
        let s = String::from_utf8_lossy(&out.stdout).trim().to_string();
        if s.is_empty() {
            None
        } else {
            Some(PathBuf::from(s))
        }
    }
}
