//! Demotion engine
//!
//! Two paths:
//! - Recruits (probation rank) can only be demoted by administrators, after
//!   a two-option confirmation: downgrade to guest, or remove from the server.
//! - Everyone else steps one rank down; the new role replaces the old one.

use crate::confirm::{Choice, PendingKey};
use crate::context::BotContext;
use crate::error::{CommandError, RankAction};
use crate::hierarchy::RankedRole;
use crate::platform::find_role;
use crate::types::{InboundMessage, Member, MemberId};
use std::sync::Arc;

const CONFIRMATION_PROMPT: &str = "You are about to demote a recruit. Choose an option:\n\
                                   1. Make the member a guest\n\
                                   2. Remove the member from the clan";
const FAREWELL: &str = "For one reason or another, you are not a fit for our community.";
const KICK_REASON: &str = "Removed from probation by command";

/// Result of a successful demotion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Demotion {
    /// Moved one rank down
    Stepped {
        /// Demoted member
        member_id: MemberId,
        /// Role removed
        from: RankedRole,
        /// Role granted
        to: RankedRole,
        /// Display name of the granted role
        role_name: String,
    },
    /// Recruit reduced to exactly the guest role
    Guest {
        /// Demoted member
        member_id: MemberId,
    },
    /// Recruit removed from the server
    Removed {
        /// Removed member
        member_id: MemberId,
        /// Whether the farewell direct message got through
        farewell_delivered: bool,
    },
}

/// Demotes members one rank at a time
#[derive(Debug, Clone)]
pub struct DemotionEngine {
    ctx: Arc<BotContext>,
}

impl DemotionEngine {
    /// Create engine over shared context
    #[inline]
    #[must_use]
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    /// Demote `target` on behalf of `actor`
    ///
    /// # Errors
    /// - `CommandError::Unranked` if either member holds no ranked role
    /// - `CommandError::InsufficientRank` unless `actor` strictly outranks `target`
    /// - `CommandError::AdminRequired` for recruits when `actor` is not an administrator
    /// - `CommandError::ConfirmationTimedOut` if the recruit prompt goes unanswered
    /// - `CommandError::NoLowerRank` if there is no rank below the target
    /// - `CommandError::RoleNotFound` if the new role is missing on the server
    /// - `CommandError::Platform` on external failures
    pub async fn demote(
        &self,
        origin: &InboundMessage,
        actor: &Member,
        target: &Member,
    ) -> Result<Demotion, CommandError> {
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
                action: RankAction::Demote,
            });
        }

        if target_rank.rank == hierarchy.probation_rank() {
            if !hierarchy.is_admin(&actor_rank.role_id) {
                return Err(CommandError::AdminRequired);
            }
            self.dismiss_recruit(origin, target).await
        } else {
            self.step_down(origin, target, target_rank).await
        }
    }

    async fn dismiss_recruit(
        &self,
        origin: &InboundMessage,
        target: &Member,
    ) -> Result<Demotion, CommandError> {
        let confirmations = self.ctx.confirmations();
        // register before prompting so a fast answer is not missed
        let pending = confirmations.register(PendingKey::new(
            origin.channel_id.clone(),
            origin.author_id.clone(),
        ));
        if let Err(e) = self.ctx.reply(origin, CONFIRMATION_PROMPT).await {
            confirmations.cancel(pending);
            return Err(e.into());
        }

        let timeout = self.ctx.config().probation.confirmation_timeout();
        let Some(choice) = confirmations.wait(pending, timeout).await else {
            tracing::info!(member = %target.id, "recruit demotion abandoned");
            return Err(CommandError::ConfirmationTimedOut {
                duration_secs: timeout.as_secs(),
            });
        };

        let channels = &self.ctx.config().channels;
        let mention = target.id.mention();
        match choice {
            Choice::DowngradeToGuest => {
                let guest = self.ctx.config().roles.guest.clone();
                self.ctx
                    .platform()
                    .set_roles(&target.id, std::slice::from_ref(&guest))
                    .await?;
                tracing::info!(member = %target.id, "recruit downgraded to guest");

                self.ctx
                    .reply(origin, &format!("{mention} was demoted to guest."))
                    .await?;
                self.ctx
                    .notifier()
                    .notify(
                        &channels.announcements,
                        &format!("Player {mention} has been demoted to guest."),
                    )
                    .await;
                Ok(Demotion::Guest {
                    member_id: target.id.clone(),
                })
            }
            Choice::Remove => {
                let farewell_delivered =
                    match self.ctx.platform().send_direct(&target.id, FAREWELL).await {
                        Ok(()) => true,
                        Err(e) => {
                            tracing::warn!(member = %target.id, error = %e, "failed to send farewell message");
                            false
                        }
                    };
                self.ctx.platform().kick(&target.id, KICK_REASON).await?;
                tracing::info!(member = %target.id, "recruit removed from server");

                self.ctx
                    .reply(origin, &format!("{mention} was removed from the server."))
                    .await?;
                self.ctx
                    .notifier()
                    .notify(
                        &channels.announcements,
                        &format!("Player {mention} is no longer with us for breaking the clan rules."),
                    )
                    .await;
                Ok(Demotion::Removed {
                    member_id: target.id.clone(),
                    farewell_delivered,
                })
            }
        }
    }

    async fn step_down(
        &self,
        origin: &InboundMessage,
        target: &Member,
        current: RankedRole,
    ) -> Result<Demotion, CommandError> {
        let hierarchy = self.ctx.hierarchy();
        let new_rank = current.rank.down();
        let new_role_id = hierarchy
            .role_at(new_rank)
            .cloned()
            .ok_or(CommandError::NoLowerRank)?;
        let new_role = find_role(self.ctx.platform(), &new_role_id)
            .await?
            .ok_or(CommandError::RoleNotFound(new_role_id))?;

        let platform = self.ctx.platform();
        platform.add_role(&target.id, &new_role.id).await?;
        platform.remove_role(&target.id, &current.role_id).await?;
        tracing::info!(
            member = %target.id,
            from = %current.role_id,
            to = %new_role.id,
            "member demoted"
        );

        self.ctx
            .reply(
                origin,
                &format!("{} was demoted to {}.", target.display_name, new_role.name),
            )
            .await?;
        self.ctx
            .notifier()
            .notify(
                &self.ctx.config().channels.announcements,
                &format!(
                    "Player {} has been demoted to {}",
                    target.id.mention(),
                    new_role.name
                ),
            )
            .await;

        Ok(Demotion::Stepped {
            member_id: target.id.clone(),
            from: current,
            to: RankedRole {
                rank: new_rank,
                role_id: new_role.id,
            },
            role_name: new_role.name,
        })
    }
}
