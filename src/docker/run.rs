#![allow(clippy::module_name_repetitions)]
//! `docker run` argument composition for a session container.

use std::ffi::OsString;

use super::flags::{push_env_kv, push_label, push_mount, tty_flags};
use crate::config::PortMapping;
use crate::mounts::Mount;

/// Everything `docker run` needs for one session container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub name: String,
    pub image: String,
    pub labels: Vec<(String, String)>,
    pub mounts: Vec<Mount>,
    pub env: Vec<(String, String)>,
    pub ports: Vec<PortMapping>,
    pub tty: bool,
    /// Empty means the image's default command.
    pub command: Vec<String>,
}

fn collect_security_flags() -> Vec<OsString> {
    vec![
        OsString::from("--cap-drop=ALL"),
        OsString::from("--security-opt=no-new-privileges"),
    ]
}

impl RunSpec {
    /// Arguments after the docker binary, in a stable order:
    /// `run --rm -i [-t] <security> <labels> --name <name> <mounts> <env> <ports> <image> <command>`.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![OsString::from("run"), OsString::from("--rm")];
        args.extend(tty_flags(self.tty));
        args.extend(collect_security_flags());

        for (k, v) in &self.labels {
            push_label(&mut args, k, v);
        }

        args.push(OsString::from("--name"));
        args.push(OsString::from(&self.name));

        for m in &self.mounts {
            push_mount(&mut args, m);
        }
        for (k, v) in &self.env {
            push_env_kv(&mut args, k, v);
        }
        for p in &self.ports {
            args.push(OsString::from("-p"));
            args.push(OsString::from(p.as_str()));
        }

        args.push(OsString::from(&self.image));
        args.extend(self.command.iter().map(OsString::from));
        args
    }
}
