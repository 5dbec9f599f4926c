#![allow(clippy::module_name_repetitions)]
//! Docker runtime discovery.

use std::io;
use std::path::PathBuf;

use which::which;

/// Locate the docker binary on PATH. A missing binary is `NotFound`.
pub fn container_runtime_path() -> io::Result<PathBuf> {
    which("docker").map_err(|_| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "Docker is required but was not found in PATH.",
        )
    })
}
