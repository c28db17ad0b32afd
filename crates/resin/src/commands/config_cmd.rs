//! Config subcommand handlers.

use resin_config::{load_config, load_config_or_default};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // Paths are still worth printing when the file itself is broken
        ConfigCommand::Path => {
            let config = load_config_or_default();
            let name = resin_config::active_profile_name(global.profile.as_deref(), &config);
            let profile = config.profiles.get(&name).cloned().unwrap_or_default();

            println!("config: {}", resin_config::config_path().display());
            println!("token:  {}", resin_config::token_path(&profile).display());
            Ok(())
        }

        ConfigCommand::Show => {
            let config = load_config()?.redacted();
            let rendered =
                toml::to_string_pretty(&config).map_err(resin_config::ConfigError::from)?;
            print!("{rendered}");
            Ok(())
        }
    }
}
