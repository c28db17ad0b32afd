//! Clap derive structures for the `resin` CLI.

use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// resin -- follow live logs from resin.io devices
#[derive(Debug, Parser)]
#[command(
    name = "resin",
    version,
    about = "Stream live logs from resin.io devices",
    long_about = "Stream live logs from resin.io devices.\n\n\
        Resolves a device's logs channel through the resin API and follows it\n\
        over PubNub until interrupted.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "RESIN_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, env = "RESIN_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Session token (overrides every configured token source)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stream a device's live logs to stdout until interrupted
    #[command(alias = "log")]
    Logs(LogsArgs),

    /// Print the logs channel a device publishes on
    Channel(ChannelArgs),

    /// Show the identity carried by the session token
    Whoami(WhoamiArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Device UUID
    pub uuid: String,
}

#[derive(Debug, Args)]
pub struct ChannelArgs {
    /// Device UUID
    pub uuid: String,
}

#[derive(Debug, Args)]
pub struct WhoamiArgs {
    /// Print the claims as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file and token file locations
    Path,

    /// Display the loaded configuration (tokens redacted)
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
