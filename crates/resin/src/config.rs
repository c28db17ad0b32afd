//! Global flags layered over `resin_config` profiles.
//!
//! This is the single boundary where CLI state turns into a
//! `resin_api::ClientConfig`.

use secrecy::SecretString;

use resin_api::ClientConfig;
use resin_config::{Config, Profile};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The profile selected by `--profile` / `default_profile`, with global
/// flag overrides applied.
pub struct ActiveProfile {
    pub name: String,
    pub profile: Profile,
    pub config: Config,
}

impl ActiveProfile {
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = resin_config::load_config()?;
        Self::select(config, global)
    }

    fn select(config: Config, global: &GlobalOpts) -> Result<Self, CliError> {
        let name = resin_config::active_profile_name(global.profile.as_deref(), &config);

        let mut profile = match config.profiles.get(&name) {
            Some(profile) => profile.clone(),
            // Only an explicit choice has to exist; the implicit default may be empty.
            None if global.profile.is_some() => {
                let mut available: Vec<_> = config.profiles.keys().cloned().collect();
                available.sort();
                return Err(CliError::ProfileNotFound {
                    name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                    path: resin_config::config_path().display().to_string(),
                });
            }
            None => Profile::default(),
        };

        if let Some(ref url) = global.api_url {
            profile.api_url = Some(url.clone());
        }
        if global.insecure {
            profile.insecure = Some(true);
        }
        if let Some(timeout) = global.timeout {
            profile.timeout = Some(timeout);
        }

        Ok(Self {
            name,
            profile,
            config,
        })
    }

    /// `--token`, then the configured credential chain.
    pub fn token(&self, global: &GlobalOpts) -> Result<SecretString, CliError> {
        if let Some(ref token) = global.token {
            return Ok(SecretString::from(token.clone()));
        }
        resin_config::resolve_token(&self.profile, &self.name).map_err(|e| match e {
            resin_config::ConfigError::NoCredentials { profile } => CliError::NoCredentials {
                profile,
                token_path: resin_config::token_path(&self.profile)
                    .display()
                    .to_string(),
            },
            other => other.into(),
        })
    }

    pub fn client_config(&self, global: &GlobalOpts) -> Result<ClientConfig, CliError> {
        let token = self.token(global)?;
        Ok(resin_config::build_client_config(
            &self.profile,
            &self.config.defaults,
            token,
        )?)
    }
}
