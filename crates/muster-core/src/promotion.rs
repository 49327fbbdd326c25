//! Promotion engine
//!
//! Moves a member one rank up the ladder. Promotion is additive: the new
//! role is granted and the previous one is kept. Entering the probation rank
//! starts the review window by recording a timestamp.

use crate::context::BotContext;
use crate::error::{CommandError, RankAction};
use crate::hierarchy::RankedRole;
use crate::platform::find_role;
use crate::types::{InboundMessage, Member, MemberId};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Result of a successful promotion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    /// Promoted member
    pub member_id: MemberId,
    /// Highest ranked role before the promotion
    pub from: RankedRole,
    /// Role granted
    pub to: RankedRole,
    /// Display name of the granted role
    pub role_name: String,
    /// Set when the promotion started probation
    pub probation_started: Option<DateTime<Utc>>,
}

/// Promotes members one rank at a time
#[derive(Debug, Clone)]
pub struct PromotionEngine {
    ctx: Arc<BotContext>,
}

impl PromotionEngine {
    /// Create engine over shared context
    #[inline]
    #[must_use]
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    /// Promote `target` on behalf of `actor`
    ///
    /// # Errors
    /// - `CommandError::Unranked` if either member holds no ranked role
    /// - `CommandError::InsufficientRank` unless `actor` strictly outranks `target`
    /// - `CommandError::NoHigherRank` if there is no rank above the target
    /// - `CommandError::RoleNotFound` if the new role is missing on the server
    /// - `CommandError::Platform` / `CommandError::Store` on external failures
    pub async fn promote(
        &self,
        origin: &InboundMessage,
        actor: &Member,
        target: &Member,
    ) -> Result<Promotion, CommandError> {
        let hierarchy = self.ctx.hierarchy();
        let actor_rank = hierarchy
            .highest_rank_of(actor)
            .ok_or(CommandError::Unranked)?;
        let target_rank = hierarchy
            .highest_rank_of(target)
            .ok_or(CommandError::Unranked)?;

        if !actor_rank.rank.outranks(target_rank.rank) {
            return Err(CommandError::InsufficientRank {
                actor: actor_rank.rank.index(),
                target: target_rank.rank.index(),
                action: RankAction::Promote,
            });
        }

        let new_rank = target_rank.rank.up().ok_or(CommandError::NoHigherRank)?;
        let new_role_id = hierarchy
            .role_at(new_rank)
            .cloned()
            .ok_or(CommandError::NoHigherRank)?;
        let new_role = find_role(self.ctx.platform(), &new_role_id)
            .await?
            .ok_or(CommandError::RoleNotFound(new_role_id))?;

        self.ctx.platform().add_role(&target.id, &new_role.id).await?;
        tracing::info!(
            actor = %actor.id,
            member = %target.id,
            role = %new_role.id,
            rank = %new_rank,
            "member promoted"
        );

        let probation_started = if new_rank == hierarchy.probation_rank() {
            let now = Utc::now();
            let store = self.ctx.store();
            store.set(target.id.clone(), now);
            store.save_all()?;
            self.ctx
                .notifier()
                .notify(&self.ctx.config().channels.recruit_chat, &self.recruit_welcome(target))
                .await;
            Some(now)
        } else {
            None
        };

        self.ctx
            .reply(
                origin,
                &format!("{} was promoted to {}.", target.display_name, new_role.name),
            )
            .await?;
        self.ctx
            .notifier()
            .notify(
                &self.ctx.config().channels.announcements,
                &format!(
                    "Player {} has been promoted to {}",
                    target.id.mention(),
                    new_role.name
                ),
            )
            .await;

        Ok(Promotion {
            member_id: target.id.clone(),
            from: target_rank,
            to: RankedRole {
                rank: new_rank,
                role_id: new_role.id,
            },
            role_name: new_role.name,
            probation_started,
        })
    }

    fn recruit_welcome(&self, target: &Member) -> String {
        let config = self.ctx.config();
        format!(
            "Player {mention} is now a recruit. Welcome!\n\
             You will hold the recruit role for {days} days, after which command decides \
             whether to promote you or extend your probation. If you are not a fit for the \
             clan you will get a direct message.\n\
             Use {status} to see how much of your probation is left.\n\
             Follow orders, storm objectives and keep to the rules. Every violation is punished!",
            mention = target.id.mention(),
            days = config.probation.window_days,
            status = config.commands.status,
        )
    }
}
