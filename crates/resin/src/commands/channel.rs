//! `resin channel <uuid>`

use resin_api::ResinClient;
use resin_api::logs::resolve_channel;

use crate::cli::ChannelArgs;
use crate::error::CliError;

pub async fn handle(args: ChannelArgs, client: &ResinClient) -> Result<(), CliError> {
    let channel = resolve_channel(client, &args.uuid).await?;
    println!("{channel}");
    Ok(())
}
