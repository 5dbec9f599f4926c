#![allow(clippy::module_name_repetitions)]
//! Color mode configuration and color-aware stderr messages.
//!
//! User-facing one-liners (warnings, refusals, the final error) go through the
//! `log_*_stderr` helpers; diagnostic detail goes through `tracing`.
//! Precompute `color_enabled_stderr()` once per function and reuse it.

use clap::ValueEnum;
use once_cell::sync::OnceCell;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn enabled_for(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => is_tty,
        }
    }

    /// Parse the value of `DEVCONTAINER_COLOR`.
    pub fn parse_env(s: &str) -> Option<ColorMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(ColorMode::Auto),
            "always" | "on" | "true" | "yes" => Some(ColorMode::Always),
            "never" | "off" | "false" | "no" => Some(ColorMode::Never),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct ColorSettings {
    mode: ColorMode,
    no_color: bool,
}

static COLOR: OnceCell<ColorSettings> = OnceCell::new();

/// Fix the color policy once at startup. `no_color` mirrors the NO_COLOR convention
/// and wins over any mode.
pub fn set_color_mode(mode: ColorMode, no_color: bool) {
    let _ = COLOR.set(ColorSettings { mode, no_color });
}

fn color_enabled_for(is_tty: bool) -> bool {
    match COLOR.get() {
        Some(s) if s.no_color => false,
        Some(s) => s.mode.enabled_for(is_tty),
        None => is_tty,
    }
}

pub fn color_enabled_stderr() -> bool {
    color_enabled_for(atty::is(atty::Stream::Stderr))
}

/// Wrap string with ANSI color code when enabled; otherwise return unchanged.
pub fn paint(enabled: bool, code: &str, s: &str) -> String {
    if enabled {
        format!("{code}{s}\x1b[0m")
    } else {
        s.to_string()
    }
}

pub fn log_info_stderr(use_color: bool, msg: &str) {
    eprintln!("{}", paint(use_color, "\x1b[36;1m", msg));
}

pub fn log_warn_stderr(use_color: bool, msg: &str) {
    eprintln!("{}", paint(use_color, "\x1b[33m", msg));
}

pub fn log_error_stderr(use_color: bool, msg: &str) {
    eprintln!("{}", paint(use_color, "\x1b[31;1m", msg));
}

/// Print a standardized warning line to stderr.
pub fn warn_print(msg: &str) {
    let use_err = color_enabled_stderr();
    log_warn_stderr(use_err, &format!("warning: {msg}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_variants() {
        assert_eq!(ColorMode::parse_env(" Always "), Some(ColorMode::Always));
        assert_eq!(ColorMode::parse_env("off"), Some(ColorMode::Never));
        assert_eq!(ColorMode::parse_env("auto"), Some(ColorMode::Auto));
        assert_eq!(ColorMode::parse_env("sometimes"), None);
    }

    #[test]
    fn test_paint_only_when_enabled() {
        assert_eq!(paint(false, "\x1b[31m", "x"), "x");
        assert_eq!(paint(true, "\x1b[31m", "x"), "\x1b[31mx\x1b[0m");
    }

    #[test]
    fn test_mode_resolution() {
        assert!(ColorMode::Always.enabled_for(false));
        assert!(!ColorMode::Never.enabled_for(true));
        assert!(ColorMode::Auto.enabled_for(true));
        assert!(!ColorMode::Auto.enabled_for(false));
    }
}
