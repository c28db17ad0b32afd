//! Command dispatch: bridges CLI args -> resin API calls -> stdout.

pub mod channel;
pub mod config_cmd;
pub mod logs;
pub mod whoami;

use resin_api::{ClientConfig, ResinClient};

use crate::cli::Command;
use crate::error::CliError;

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: ResinClient,
    config: &ClientConfig,
) -> Result<(), CliError> {
    match cmd {
        Command::Logs(args) => logs::handle(args, client, config).await,
        Command::Channel(args) => channel::handle(args, &client).await,
        // Handled before a client is built
        Command::Whoami(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
