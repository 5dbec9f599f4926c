mod cli;

use std::env;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use nix::unistd::{getgid, getuid};

use devcontainer::attach::{attach, list_filters, Prompter};
use devcontainer::mounts::HostFs;
use devcontainer::ui::TerminalPrompter;
use devcontainer::{
    color_enabled_stderr, exit_code_for_child, exit_code_for_session_error, log_error_stderr, set_color_mode, telemetry_init, vcs,
    ColorMode, DockerCli, EnvSnapshot, ExecConfig, HostContext, Orchestrator, SessionError,
    StartConfig, StartOptions,
};

use crate::cli::{Cli, Command};

fn host_context(stdin_tty: bool) -> anyhow::Result<HostContext> {
    let cwd = env::current_dir().context("getting working directory")?;
    let home = home::home_dir().context("could not determine home directory")?;
    Ok(HostContext {
        cwd,
        home,
        scratch_dir: env::temp_dir(),
        uid: getuid().as_raw(),
        gid: getgid().as_raw(),
        stdin_tty,
    })
}

fn docker_cli(verbose: bool) -> Result<DockerCli, SessionError> {
    DockerCli::new(verbose).map_err(SessionError::RuntimeLaunch)
}

async fn run_start(opts: StartOptions, env: &EnvSnapshot, verbose: bool) -> anyhow::Result<u8> {
    let host = host_context(atty::is(atty::Stream::Stdin))?;
    // Flags are validated before docker is located
    let cfg = StartConfig::new(opts, env, host)?;
    let docker = docker_cli(verbose)?;
    let probe = HostFs;
    let outcome = Orchestrator::new(&docker, &probe).start(&cfg).await?;
    Ok(outcome.exit_code())
}

async fn run_exec(name: Option<String>, env: &EnvSnapshot, verbose: bool) -> anyhow::Result<u8> {
    let cwd = env::current_dir().context("getting working directory")?;
    let cfg = ExecConfig::new(name, env, &cwd, atty::is(atty::Stream::Stdin));
    let root = cfg.workspace_root(&vcs::default_backends());
    let filters = list_filters(&cfg.default_container_name, Some(&root));

    let docker = docker_cli(verbose)?;
    let terminal = TerminalPrompter;
    let prompter: Option<&dyn Prompter> = if cfg.stdin_tty { Some(&terminal) } else { None };
    let code = attach(&docker, cfg.target.as_deref(), &filters, cfg.stdin_tty, prompter).await?;
    Ok(exit_code_for_child(code))
}

fn exit_code_for(e: &anyhow::Error) -> u8 {
    e.downcast_ref::<SessionError>()
        .map(exit_code_for_session_error)
        .unwrap_or(1)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let env = EnvSnapshot::capture();

    let mode = cli
        .color
        .or_else(|| env.color.as_deref().and_then(ColorMode::parse_env))
        .unwrap_or(ColorMode::Auto);
    set_color_mode(mode, env.no_color);
    telemetry_init(env.log_filter.as_deref(), cli.verbose);

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")
        .and_then(|rt| match cli.command {
            Command::Start(args) => rt.block_on(run_start(args.into(), &env, cli.verbose)),
            Command::Exec { name } => rt.block_on(run_exec(name, &env, cli.verbose)),
        });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            let use_err = color_enabled_stderr();
            log_error_stderr(use_err, &format!("devcontainer: {e:#}"));
            ExitCode::from(exit_code_for(&e))
        }
    }
}
