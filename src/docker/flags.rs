#![allow(clippy::module_name_repetitions)]
//! Docker argument helpers shared by `run`, `build` and `exec`.

use std::ffi::OsString;

use crate::mounts::Mount;

pub(crate) fn push_env_kv(args: &mut Vec<OsString>, key: &str, val: &str) {
    args.push(OsString::from("-e"));
    args.push(OsString::from(format!("{key}={val}")));
}

pub(crate) fn push_mount(args: &mut Vec<OsString>, m: &Mount) {
    args.push(OsString::from("-v"));
    args.push(m.volume_spec());
}

pub(crate) fn push_label(args: &mut Vec<OsString>, key: &str, val: &str) {
    args.push(OsString::from("--label"));
    args.push(OsString::from(format!("{key}={val}")));
}

pub(crate) fn push_build_arg(args: &mut Vec<OsString>, key: &str, val: &str) {
    args.push(OsString::from("--build-arg"));
    args.push(OsString::from(format!("{key}={val}")));
}

/// `-i`, plus `-t` when stdin is a terminal.
pub(crate) fn tty_flags(tty: bool) -> Vec<OsString> {
    if tty {
        vec![OsString::from("-i"), OsString::from("-t")]
    } else {
        vec![OsString::from("-i")]
    }
}
