//! `resin logs <uuid>`: follow a device's live logs on stdout.
//!
//! Lines go to stdout, one per log entry; diagnostics go to stderr through
//! tracing. Ctrl-C stops the stream and exits cleanly.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use resin_api::logs::{Session, WriterSink};
use resin_api::{ClientConfig, ResinClient, TokenClaims};

use crate::cli::LogsArgs;
use crate::error::CliError;

pub async fn handle(
    args: LogsArgs,
    client: ResinClient,
    config: &ClientConfig,
) -> Result<(), CliError> {
    warn_if_expired(&config.token);

    let session = Session::connect(client, config).await?;

    let stop = session.stop_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted");
            stop.stop();
        }
    });

    let mut sink = WriterSink::new(tokio::io::stdout());
    let result = session.log(&args.uuid, &mut sink).await;
    interrupt.abort();

    Ok(result?)
}

fn warn_if_expired(token: &SecretString) {
    match TokenClaims::parse(token.expose_secret()) {
        Ok(claims) if claims.is_expired() => {
            warn!(
                username = claims.username.as_deref().unwrap_or("unknown"),
                "session token has expired, the API will likely reject it"
            );
        }
        Ok(_) => {}
        Err(_) => debug!("session token is not a JWT, skipping expiry check"),
    }
}
