#![allow(clippy::module_name_repetitions)]
//! Small utilities: shell quoting for command previews, session suffixes.

pub mod id;

use std::ffi::OsStr;

pub fn shell_join<S: AsRef<OsStr>>(args: &[S]) -> String {
    args.iter()
        .map(|a| shell_escape(&a.as_ref().to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        "''".to_string()
    } else if s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_=./:@".contains(c))
    {
        s.to_string()
    } else {
        let escaped = s.replace('\'', "'\"'\"'");
        format!("'{}'", escaped)
    }
}
