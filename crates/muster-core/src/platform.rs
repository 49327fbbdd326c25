//! Chat platform seam
//!
//! Everything the bot needs from the chat service: member and role listings,
//! role mutations, removal, and message delivery. Implementations live
//! outside this crate (REST adapter, in-memory fakes for tests).

use crate::error::PlatformError;
use crate::types::{ChannelId, Member, MemberId, MessageId, Role, RoleId};
use async_trait::async_trait;

/// Operations the bot invokes on the chat platform
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// List every server member (fresh fetch)
    async fn members(&self) -> Result<Vec<Member>, PlatformError>;

    /// List every server role (fresh fetch)
    async fn roles(&self) -> Result<Vec<Role>, PlatformError>;

    /// Grant a role to a member
    async fn add_role(&self, member: &MemberId, role: &RoleId) -> Result<(), PlatformError>;

    /// Revoke a role from a member
    async fn remove_role(&self, member: &MemberId, role: &RoleId) -> Result<(), PlatformError>;

    /// Replace a member's whole role set
    async fn set_roles(&self, member: &MemberId, roles: &[RoleId]) -> Result<(), PlatformError>;

    /// Remove a member from the server
    async fn kick(&self, member: &MemberId, reason: &str) -> Result<(), PlatformError>;

    /// Send a direct message to a member
    async fn send_direct(&self, member: &MemberId, text: &str) -> Result<(), PlatformError>;

    /// Post to a channel
    async fn send_channel(&self, channel: &ChannelId, text: &str) -> Result<(), PlatformError>;

    /// Post a reply to a specific message
    async fn reply(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        text: &str,
    ) -> Result<(), PlatformError>;
}

/// Look up a role by id in a fresh role listing
///
/// # Errors
/// Propagates the listing failure.
pub async fn find_role(
    platform: &dyn ChatPlatform,
    role: &RoleId,
) -> Result<Option<Role>, PlatformError> {
    Ok(platform.roles().await?.into_iter().find(|r| &r.id == role))
}
