//! Gateway settings
//!
//! The bot's TOML configuration extended with a `[gateway]` section. The bot
//! token is never read from the file; `token_env` names the environment
//! variable that holds it.

use crate::error::{GatewayError, GatewayResult};
use muster_core::{BotConfig, ConfigError};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Full settings for the `muster` binary
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Bot configuration (roles, channels, commands, probation, store)
    #[serde(flatten)]
    pub bot: BotConfig,
    /// Platform connection settings
    pub gateway: GatewayConfig,
}

/// Platform connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Server (guild) the bot manages
    pub guild_id: String,
    /// REST API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Address the event intake listens on
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Environment variable holding the bot token
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Shared secret the relay must send in `x-muster-secret`
    #[serde(default)]
    pub intake_secret: Option<String>,
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8686))
}

fn default_token_env() -> String {
    "MUSTER_TOKEN".to_string()
}

impl Settings {
    /// Parse and validate settings from TOML text
    ///
    /// # Errors
    /// Returns `GatewayError::Config` on malformed or invalid settings.
    pub fn from_toml_str(text: &str) -> GatewayResult<Self> {
        let settings: Self = toml::from_str(text).map_err(ConfigError::from)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a file
    ///
    /// # Errors
    /// Same as [`Settings::from_toml_str`], plus `ConfigError::Io`.
    pub fn load(path: impl AsRef<Path>) -> GatewayResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.bot.validate()?;
        if self.gateway.guild_id.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.guild_id must not be empty".into()));
        }
        if self.gateway.token_env.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.token_env must not be empty".into()));
        }
        Ok(())
    }

    /// Read the bot token from the configured environment variable
    ///
    /// # Errors
    /// Returns `GatewayError::MissingToken` if the variable is unset or blank.
    pub fn token(&self) -> GatewayResult<String> {
        let var = &self.gateway.token_env;
        match std::env::var(var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(GatewayError::MissingToken(var.clone())),
        }
    }
}
