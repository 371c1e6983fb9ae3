use std::fs;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use ozmon_cli::logging;
use ozmon_core::HomeLayout;
use ozmon_core::find_ozmon_home;

mod inspect_cmd;
mod list_cmd;
mod start_cmd;
mod status_cmd;
mod stop_cmd;

use crate::inspect_cmd::InspectArgs;
use crate::list_cmd::ListArgs;
use crate::start_cmd::StartArgs;
use crate::status_cmd::StatusArgs;
use crate::stop_cmd::StopArgs;

/// Configure and run OpenZeppelin Monitor sessions.
#[derive(Debug, Parser)]
#[clap(author, version)]
struct MultitoolCli {
    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[derive(Debug, clap::Subcommand)]
enum Subcommand {
    /// Configure a monitoring tool (first run or --reconfigure) and launch it.
    Start(StartArgs),

    /// List recorded monitor sessions.
    List(ListArgs),

    /// Stop a running session and delete its working directory.
    Stop(StopArgs),

    /// Report whether a session's process is alive.
    Status(StatusArgs),

    /// Show the functions and events a Soroban contract exports.
    Inspect(InspectArgs),
}

#[tokio::main]
async fn main() {
    let cli = MultitoolCli::parse();
    if let Err(err) = cli_main(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn cli_main(cli: MultitoolCli) -> Result<()> {
    let home = find_ozmon_home().context("failed to locate the ozmon home directory")?;
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create {}", home.display()))?;
    let layout = HomeLayout::new(home);
    let _log_guard = logging::init(&layout)?;

    match cli.subcommand {
        Subcommand::Start(args) => start_cmd::run(&layout, args).await,
        Subcommand::List(args) => list_cmd::run(&layout, args),
        Subcommand::Stop(args) => stop_cmd::run(&layout, args),
        Subcommand::Status(args) => status_cmd::run(&layout, args),
        Subcommand::Inspect(args) => inspect_cmd::run(&layout, args).await,
    }
}
