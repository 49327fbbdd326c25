//! Shared bot state
//!
//! One [`BotContext`] is built at startup and shared (behind `Arc`) by the
//! router and every engine.

use crate::config::BotConfig;
use crate::confirm::ConfirmationRegistry;
use crate::error::{ConfigError, PlatformError};
use crate::hierarchy::RoleHierarchy;
use crate::notify::Notifier;
use crate::platform::ChatPlatform;
use crate::store::PromotionStore;
use crate::types::InboundMessage;
use std::sync::Arc;

/// Configuration, collaborators and dialog state shared across handlers
pub struct BotContext {
    config: BotConfig,
    hierarchy: RoleHierarchy,
    platform: Arc<dyn ChatPlatform>,
    store: Arc<dyn PromotionStore>,
    notifier: Notifier,
    confirmations: ConfirmationRegistry,
}

impl BotContext {
    /// Build context, deriving the role ladder from `config`
    ///
    /// # Errors
    /// - `ConfigError` if the configuration does not validate
    pub fn new(
        config: BotConfig,
        platform: Arc<dyn ChatPlatform>,
        store: Arc<dyn PromotionStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let hierarchy = RoleHierarchy::from_config(&config.roles)?;
        Ok(Self {
            config,
            hierarchy,
            notifier: Notifier::new(Arc::clone(&platform)),
            platform,
            store,
            confirmations: ConfirmationRegistry::new(),
        })
    }

    /// Bot configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Role ladder
    #[inline]
    #[must_use]
    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    /// Chat platform
    #[inline]
    #[must_use]
    pub fn platform(&self) -> &dyn ChatPlatform {
        self.platform.as_ref()
    }

    /// Promotion record store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &dyn PromotionStore {
        self.store.as_ref()
    }

    /// Channel notifier
    #[inline]
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Pending confirmation dialogs
    #[inline]
    #[must_use]
    pub fn confirmations(&self) -> &ConfirmationRegistry {
        &self.confirmations
    }

    /// Reply to the message that triggered a command
    ///
    /// # Errors
    /// Propagates the platform failure.
    pub async fn reply(&self, origin: &InboundMessage, text: &str) -> Result<(), PlatformError> {
        self.platform
            .reply(&origin.channel_id, &origin.id, text)
            .await
    }
}

impl std::fmt::Debug for BotContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotContext")
            .field("hierarchy", &self.hierarchy)
            .field("pending_confirmations", &self.confirmations.len())
            .finish_non_exhaustive()
    }
}
