mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use resin_api::ResinClient;

use crate::cli::{Cli, Command};
use crate::config::ActiveProfile;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries log lines only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Local-only commands need neither a client nor the network
        Command::Config(ref args) => commands::config_cmd::handle(args, &cli.global),
        Command::Whoami(ref args) => commands::whoami::handle(args, &cli.global),

        Command::Completions(ref args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "resin", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let active = ActiveProfile::load(&cli.global)?;
            let config = active.client_config(&cli.global)?;
            let client = ResinClient::new(&config)?;

            tracing::debug!(command = ?cmd, profile = %active.name, "dispatching command");
            commands::dispatch(cmd, client, &config).await
        }
    }
}
