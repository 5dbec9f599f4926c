//! Tracing subscriber setup.
//!
//! Filter precedence: explicit filter string (DEVCONTAINER_LOG, then RUST_LOG, captured
//! by the caller) > `--verbose` (debug for this crate) > warn.

use once_cell::sync::OnceCell;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

static INIT: OnceCell<()> = OnceCell::new();

fn build_filter(filter: Option<&str>, verbose: bool) -> EnvFilter {
    if let Some(f) = filter.map(str::trim).filter(|f| !f.is_empty()) {
        match EnvFilter::try_new(f) {
            Ok(ef) => return ef,
            Err(e) => {
                crate::warn_print(&format!("ignoring invalid log filter {f:?}: {e}"));
            }
        }
    }
    if verbose {
        EnvFilter::new("warn,devcontainer=debug")
    } else {
        EnvFilter::new("warn")
    }
}

/// Install the global subscriber once. Later calls are no-ops.
pub fn telemetry_init(filter: Option<&str>, verbose: bool) {
    INIT.get_or_init(|| {
        let use_color = crate::color_enabled_stderr();
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(use_color);
        // try_init: tests and embedders may have installed a subscriber already
        let _ = tracing_subscriber::registry()
            .with(build_filter(filter, verbose))
            .with(layer)
            .try_init();
    });
}
