use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use ria_reader::cli::{Cli, Command};
use ria_reader::{commands, logging};

#[tokio::main]
async fn main() -> ExitCode {
    match try_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn try_main() -> anyhow::Result<()> {
    logging::init().context("init logging")?;
    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match &cli.command {
        Command::Consulter(args) => commands::consulter(args).await.context("consulter"),
        Command::Sommaire(args) => commands::sommaire(args).await.context("sommaire"),
        Command::Serve(args) => commands::serve(args).await.context("serve"),
    }
}
