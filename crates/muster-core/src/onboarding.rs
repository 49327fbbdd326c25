//! New-member handling
//!
//! Every member who joins gets the guest role; the outcome is written to the
//! audit-log channel either way. Nothing is retried.

use crate::context::BotContext;
use crate::error::CommandError;
use crate::platform::find_role;
use crate::types::Member;
use std::sync::Arc;

/// Grants the guest role to newcomers
#[derive(Debug, Clone)]
pub struct Onboarding {
    ctx: Arc<BotContext>,
}

impl Onboarding {
    /// Create handler over shared context
    #[inline]
    #[must_use]
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    /// Assign the guest role to `member` and post an audit line
    ///
    /// # Errors
    /// - `CommandError::RoleNotFound` if the guest role is missing on the server
    /// - `CommandError::Platform` if the role listing or assignment fails
    pub async fn welcome(&self, member: &Member) -> Result<(), CommandError> {
        let audit_log = &self.ctx.config().channels.audit_log;
        match self.grant_guest(member).await {
            Ok(()) => {
                tracing::info!(member = %member.id, tag = %member.tag, "guest role granted");
                self.ctx
                    .notifier()
                    .notify(
                        audit_log,
                        &format!("✅ Guest role granted to newcomer: {}", member.tag),
                    )
                    .await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(member = %member.id, error = %e, "failed to grant guest role");
                self.ctx
                    .notifier()
                    .notify(
                        audit_log,
                        &format!(
                            "❌ Failed to grant the guest role to: {}\nError: {e}. Please tell an administrator.",
                            member.tag
                        ),
                    )
                    .await;
                Err(e)
            }
        }
    }

    async fn grant_guest(&self, member: &Member) -> Result<(), CommandError> {
        let guest_id = &self.ctx.config().roles.guest;
        // fresh listing; the role cache may be stale
        let guest = find_role(self.ctx.platform(), guest_id)
            .await?
            .ok_or_else(|| CommandError::RoleNotFound(guest_id.clone()))?;
        self.ctx.platform().add_role(&member.id, &guest.id).await?;
        Ok(())
    }
}
