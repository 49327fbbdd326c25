//! Bot configuration
//!
//! Static role and channel identifiers plus command vocabulary, loaded from
//! TOML and passed explicitly to the components that need it.

use crate::error::ConfigError;
use crate::types::{ChannelId, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest accepted probation window, in days
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Top-level bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Role identifiers forming the rank ladder
    pub roles: RoleConfig,
    /// Channel identifiers the bot posts to
    pub channels: ChannelConfig,
    /// Command vocabulary
    #[serde(default)]
    pub commands: CommandConfig,
    /// Probation review settings
    #[serde(default)]
    pub probation: ProbationConfig,
    /// Location of the promotion record file
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("promotion_dates.json")
}

impl BotConfig {
    /// Create configuration with default commands and probation settings
    #[must_use]
    pub fn new(roles: RoleConfig, channels: ChannelConfig) -> Self {
        Self {
            roles,
            channels,
            commands: CommandConfig::default(),
            probation: ProbationConfig::default(),
            store_path: default_store_path(),
        }
    }

    /// With store path
    #[inline]
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// With confirmation timeout
    #[inline]
    #[must_use]
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.probation.confirmation_timeout_secs = timeout.as_secs();
        self
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML
    /// - `ConfigError::DuplicateRole` / `ConfigError::Invalid` from validation
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file
    ///
    /// # Errors
    /// Same as [`BotConfig::from_toml_str`], plus `ConfigError::Io`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check semantic constraints
    ///
    /// # Errors
    /// - `ConfigError::DuplicateRole` if a role id repeats in the ladder
    /// - `ConfigError::Invalid` if command words are empty, timeouts zero or
    ///   the probation window outside `1..=MAX_WINDOW_DAYS`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for role in self.roles.ladder() {
            if !seen.insert(role) {
                return Err(ConfigError::DuplicateRole(role.clone()));
            }
        }

        if self.roles.admin.is_empty() {
            return Err(ConfigError::Invalid("roles.admin must not be empty".into()));
        }

        let words = [
            ("commands.prefix", &self.commands.prefix),
            ("commands.status", &self.commands.status),
            ("commands.announce", &self.commands.announce),
            ("commands.promote", &self.commands.promote),
            ("commands.demote", &self.commands.demote),
        ];
        for (name, word) in words {
            if word.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
        }
        if self.commands.promote.eq_ignore_ascii_case(&self.commands.demote) {
            return Err(ConfigError::Invalid(
                "commands.promote and commands.demote must differ".into(),
            ));
        }

        if self.probation.confirmation_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "probation.confirmation_timeout_secs must be positive".into(),
            ));
        }

        if !(1..=MAX_WINDOW_DAYS).contains(&self.probation.window_days) {
            return Err(ConfigError::Invalid(format!(
                "probation.window_days must be between 1 and {MAX_WINDOW_DAYS}"
            )));
        }

        Ok(())
    }
}

/// Role identifiers, most privileged first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Administrative roles (top of the ladder, in order)
    pub admin: Vec<RoleId>,
    /// Commander
    pub commander: RoleId,
    /// Vice-commander
    pub vice_commander: RoleId,
    /// Elite
    pub elite: RoleId,
    /// Ranger (first full-member rank)
    pub ranger: RoleId,
    /// Recruit (probation rank)
    pub recruit: RoleId,
    /// Guest (assigned on join)
    pub guest: RoleId,
}

impl RoleConfig {
    /// Roles in ladder order, most privileged first
    pub fn ladder(&self) -> impl Iterator<Item = &RoleId> {
        self.admin.iter().chain([
            &self.commander,
            &self.vice_commander,
            &self.elite,
            &self.ranger,
            &self.recruit,
            &self.guest,
        ])
    }
}

/// Channels the bot writes to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Audit trail for automatic actions
    pub audit_log: ChannelId,
    /// Recruit orientation channel
    pub recruit_chat: ChannelId,
    /// Public announcements
    pub announcements: ChannelId,
}

/// Command vocabulary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Generic command prefix (`<prefix> <name> <action>`)
    pub prefix: String,
    /// Full trigger for the probation status check
    pub status: String,
    /// Full trigger for announcements
    pub announce: String,
    /// Action word for promotion
    pub promote: String,
    /// Action word for demotion
    pub demote: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            status: "!recruit".to_string(),
            announce: "*announce".to_string(),
            promote: "promote".to_string(),
            demote: "demote".to_string(),
        }
    }
}

/// Probation review settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbationConfig {
    /// Days a recruit stays on probation before review
    pub window_days: i64,
    /// Seconds to wait for a demotion confirmation reply
    pub confirmation_timeout_secs: u64,
}

impl ProbationConfig {
    /// Confirmation wait as a duration
    #[inline]
    #[must_use]
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

impl Default for ProbationConfig {
    fn default() -> Self {
        Self {
            window_days: 14,
            confirmation_timeout_secs: 30,
        }
    }
}
