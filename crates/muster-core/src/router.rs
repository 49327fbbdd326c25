//! Command router
//!
//! Entry point for platform events:
//! - Ignores bot authors
//! - Feeds replies to pending confirmation dialogs
//! - Parses commands and dispatches them to the engines
//! - Turns every failure into one reply, so a bad command never escapes
//!   its own handler

use crate::command::{parse_command, resolve_target, usage_hint, Command};
use crate::config::BotConfig;
use crate::context::BotContext;
use crate::demotion::DemotionEngine;
use crate::error::{CommandError, ConfigError, ErrorKind, RankAction};
use crate::onboarding::Onboarding;
use crate::platform::ChatPlatform;
use crate::probation::check_status;
use crate::promotion::PromotionEngine;
use crate::store::PromotionStore;
use crate::types::{GatewayEvent, InboundMessage};
use std::sync::Arc;

/// Routes inbound events to handlers
///
/// Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    ctx: Arc<BotContext>,
    promotion: PromotionEngine,
    demotion: DemotionEngine,
    onboarding: Onboarding,
}

impl CommandRouter {
    /// Create router from configuration and collaborators
    ///
    /// # Errors
    /// - `ConfigError` if the configuration does not validate
    pub fn new(
        config: BotConfig,
        platform: Arc<dyn ChatPlatform>,
        store: Arc<dyn PromotionStore>,
    ) -> Result<Self, ConfigError> {
        let ctx = BotContext::new(config, platform, store)?;
        Ok(Self::from_context(Arc::new(ctx)))
    }

    /// Create router over an existing context
    #[must_use]
    pub fn from_context(ctx: Arc<BotContext>) -> Self {
        Self {
            promotion: PromotionEngine::new(Arc::clone(&ctx)),
            demotion: DemotionEngine::new(Arc::clone(&ctx)),
            onboarding: Onboarding::new(Arc::clone(&ctx)),
            ctx,
        }
    }

    /// Shared context
    #[inline]
    #[must_use]
    pub fn context(&self) -> &Arc<BotContext> {
        &self.ctx
    }

    /// Handle one platform event
    pub async fn handle_event(&self, event: GatewayEvent) {
        match event {
            GatewayEvent::Ready => tracing::info!("bot is online and ready"),
            GatewayEvent::MemberJoined { member } => {
                if let Err(e) = self.onboarding.welcome(&member).await {
                    // already audited and logged by the handler
                    tracing::debug!(member = %member.id, kind = ?e.kind(), "onboarding did not complete");
                }
            }
            GatewayEvent::MessageCreated { message } => self.handle_message(&message).await,
        }
    }

    /// Handle one chat message
    pub async fn handle_message(&self, message: &InboundMessage) {
        if message.author_is_bot {
            return;
        }

        if self
            .ctx
            .confirmations()
            .offer(&message.channel_id, &message.author_id, &message.content)
        {
            tracing::debug!(author = %message.author_id, "confirmation answered");
            return;
        }

        let Some(command) = parse_command(&message.content, &self.ctx.config().commands) else {
            return;
        };
        tracing::debug!(author = %message.author_id, ?command, "dispatching command");

        if let Err(e) = self.dispatch(message, command).await {
            self.report_failure(message, &e).await;
        }
    }

    async fn dispatch(&self, message: &InboundMessage, command: Command) -> Result<(), CommandError> {
        match command {
            Command::ProbationStatus => check_status(&self.ctx, message).await,
            Command::Announce { text } => self.announce(message, &text).await,
            Command::Usage => {
                self.ctx
                    .reply(message, &usage_hint(&self.ctx.config().commands))
                    .await?;
                Ok(())
            }
            Command::ChangeRank { query, action } => {
                self.change_rank(message, &query, action).await
            }
        }
    }

    async fn announce(&self, message: &InboundMessage, text: &str) -> Result<(), CommandError> {
        if text.is_empty() {
            self.ctx
                .reply(message, "Please provide the announcement text.")
                .await?;
            return Ok(());
        }
        self.ctx
            .notifier()
            .notify(&self.ctx.config().channels.announcements, text)
            .await;
        tracing::info!(author = %message.author_id, "announcement posted");
        Ok(())
    }

    async fn change_rank(
        &self,
        message: &InboundMessage,
        query: &str,
        action: RankAction,
    ) -> Result<(), CommandError> {
        let actor = message.member.as_ref().ok_or(CommandError::NotInGuild)?;

        let members = self.ctx.platform().members().await?;
        let target = resolve_target(&members, query)
            .ok_or_else(|| CommandError::MemberNotFound(query.to_string()))?;

        let hierarchy = self.ctx.hierarchy();
        if hierarchy.highest_rank_of(actor).is_none() || hierarchy.highest_rank_of(target).is_none()
        {
            return Err(CommandError::Unranked);
        }

        match action {
            RankAction::Promote => {
                self.promotion.promote(message, actor, target).await?;
            }
            RankAction::Demote => {
                self.demotion.demote(message, actor, target).await?;
            }
        }
        Ok(())
    }

    async fn report_failure(&self, message: &InboundMessage, error: &CommandError) {
        match error.kind() {
            ErrorKind::External => {
                tracing::error!(author = %message.author_id, error = %error, "command failed");
            }
            ErrorKind::Timeout => {
                tracing::info!(author = %message.author_id, error = %error, "command abandoned");
            }
            _ => {
                tracing::debug!(author = %message.author_id, error = %error, "command rejected");
            }
        }

        if let Err(e) = self.ctx.reply(message, &error.user_message()).await {
            tracing::error!(author = %message.author_id, error = %e, "failed to deliver error reply");
        }
    }
}
