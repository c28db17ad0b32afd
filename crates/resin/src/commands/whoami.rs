//! `resin whoami`: decode the session token locally.

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde_json::json;

use resin_api::TokenClaims;

use crate::cli::{GlobalOpts, WhoamiArgs};
use crate::config::ActiveProfile;
use crate::error::CliError;

pub fn handle(args: &WhoamiArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let token = ActiveProfile::load(global)?.token(global)?;
    let claims = TokenClaims::parse(token.expose_secret())?;
    let expires = claims.exp.and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0));

    if args.json {
        let out = json!({
            "username": claims.username,
            "id": claims.user_id,
            "email": claims.email,
            "expires": expires.map(|at| at.to_rfc3339()),
            "expired": claims.is_expired(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".into());
    println!("username: {}", or_dash(claims.username.clone()));
    println!("id:       {}", or_dash(claims.user_id.map(|id| id.to_string())));
    println!("email:    {}", or_dash(claims.email.clone()));
    let expiry = match expires {
        Some(at) if claims.is_expired() => format!("{} (expired)", at.to_rfc3339()),
        Some(at) => at.to_rfc3339(),
        None => "never set (treated as expired)".into(),
    };
    println!("expires:  {expiry}");
    Ok(())
}
