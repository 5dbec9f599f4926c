use clap::{Args, Parser, Subcommand};

use devcontainer::StartOptions;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nbuilt:   ",
    env!("DEVCONTAINER_BUILD_DATE"),
    "\ntarget:  ",
    env!("DEVCONTAINER_BUILD_TARGET"),
    "\nprofile: ",
    env!("DEVCONTAINER_BUILD_PROFILE"),
    "\nrustc:   ",
    env!("DEVCONTAINER_BUILD_RUSTC"),
);

#[derive(Parser, Debug)]
#[command(
    name = "devcontainer",
    version,
    long_version = LONG_VERSION,
    about = "Run Claude in a Docker devcontainer bound to a per-session git worktree or jj workspace.",
    after_long_help = "Examples:\n  devcontainer start\n  devcontainer start --name fix-login --port 3000:3000\n  devcontainer start --resume\n  devcontainer start -- bash\n  devcontainer exec fix-login\n\n",
    after_help = "\n"
)]
pub(crate) struct Cli {
    /// Debug logging and docker command previews on stderr
    #[arg(long, global = true)]
    pub(crate) verbose: bool,

    /// Colorize output: auto|always|never
    #[arg(long = "color", value_enum, global = true)]
    pub(crate) color: Option<devcontainer::ColorMode>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Build the image and start a session container
    Start(StartArgs),
    /// Open a shell in a running session container
    Exec {
        /// Container name, with or without the devcontainer- prefix
        name: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct StartArgs {
    /// Session name (random when omitted); names the worktree, branch and container
    #[arg(long)]
    pub(crate) name: Option<String>,

    /// Force a VCS backend: git or jj (overrides DEVCONTAINER_VCS)
    #[arg(long)]
    pub(crate) vcs: Option<String>,

    /// Mount the host docker socket into the container
    #[arg(long)]
    pub(crate) docker: bool,

    /// Publish a port, HOST:CONTAINER (repeatable)
    #[arg(long = "port", value_name = "HOST:CONTAINER")]
    pub(crate) ports: Vec<String>,

    /// Resume a previous conversation, optionally by id
    #[arg(long, value_name = "ID", num_args = 0..=1)]
    pub(crate) resume: Option<Option<String>>,

    /// Command to run instead of the image default
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub(crate) command: Vec<String>,
}

impl From<StartArgs> for StartOptions {
    fn from(a: StartArgs) -> Self {
        StartOptions {
            name: a.name,
            vcs: a.vcs,
            docker: a.docker,
            ports: a.ports,
            resume: a.resume,
            command: a.command,
        }
    }
}
