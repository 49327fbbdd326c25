//! Testing utilities for Muster workspace
//!
//! Shared fakes, fixtures, and a router harness.

#![allow(missing_docs)]

use async_trait::async_trait;
use muster_core::{
    BotConfig, ChannelConfig, ChannelId, ChatPlatform, CommandRouter, InboundMessage, Member,
    MemberId, MemoryStore, MessageId, PendingKey, PlatformError, Role, RoleConfig, RoleId,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const ADMIN: &str = "admin-1";
pub const SENIOR_ADMIN: &str = "admin-2";
pub const COMMANDER: &str = "commander";
pub const VICE_COMMANDER: &str = "vice-commander";
pub const ELITE: &str = "elite";
pub const RANGER: &str = "ranger";
pub const RECRUIT: &str = "recruit";
pub const GUEST: &str = "guest";

pub const AUDIT_LOG: &str = "audit-log";
pub const RECRUIT_CHAT: &str = "recruit-chat";
pub const ANNOUNCEMENTS: &str = "announcements";
pub const COMMAND_CHANNEL: &str = "ops";

/// Recorded platform call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AddRole { member: MemberId, role: RoleId },
    RemoveRole { member: MemberId, role: RoleId },
    SetRoles { member: MemberId, roles: Vec<RoleId> },
    Kick { member: MemberId, reason: String },
    Direct { member: MemberId, text: String },
    Channel { channel: ChannelId, text: String },
    Reply { channel: ChannelId, message: MessageId, text: String },
}

/// Platform operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Members,
    Roles,
    AddRole,
    RemoveRole,
    SetRoles,
    Kick,
    Direct,
    Channel,
    Reply,
}

/// In-memory chat platform
///
/// Role mutations and kicks update the stored members; every successful
/// call is recorded in order.
#[derive(Debug, Default)]
pub struct FakePlatform {
    members: Mutex<Vec<Member>>,
    roles: Mutex<Vec<Role>>,
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<Op>>,
}

impl FakePlatform {
    /// Platform with the standard server roles and the given members
    #[must_use]
    pub fn new(members: Vec<Member>) -> Self {
        Self {
            members: Mutex::new(members),
            roles: Mutex::new(server_roles()),
            ..Self::default()
        }
    }

    /// Make an operation fail from now on
    pub fn fail(&self, op: Op) {
        self.failing.lock().insert(op);
    }

    /// Delete a role from the server
    pub fn delete_role(&self, role: &str) {
        self.roles.lock().retain(|r| r.id.as_str() != role);
    }

    /// Current state of a member
    #[must_use]
    pub fn member(&self, id: &str) -> Option<Member> {
        self.members
            .lock()
            .iter()
            .find(|m| m.id.as_str() == id)
            .cloned()
    }

    /// All successful calls, in order
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Text of every reply sent
    #[must_use]
    pub fn replies(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Reply { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Text of every message posted to `channel`
    #[must_use]
    pub fn channel_messages(&self, channel: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Channel { channel: ch, text } if ch.as_str() == channel => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Calls that changed roles or membership
    #[must_use]
    pub fn mutations(&self) -> Vec<Call> {
        self.calls
            .lock()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::AddRole { .. }
                        | Call::RemoveRole { .. }
                        | Call::SetRoles { .. }
                        | Call::Kick { .. }
                )
            })
            .cloned()
            .collect()
    }

    fn check(&self, op: Op) -> Result<(), PlatformError> {
        if self.failing.lock().contains(&op) {
            Err(PlatformError::rejected(500, format!("injected {op:?} failure")))
        } else {
            Ok(())
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn update_member(
        &self,
        id: &MemberId,
        f: impl FnOnce(&mut Member),
    ) -> Result<(), PlatformError> {
        let mut members = self.members.lock();
        let member = members
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| PlatformError::NotFound(format!("member {id}")))?;
        f(member);
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn members(&self) -> Result<Vec<Member>, PlatformError> {
        self.check(Op::Members)?;
        Ok(self.members.lock().clone())
    }

    async fn roles(&self) -> Result<Vec<Role>, PlatformError> {
        self.check(Op::Roles)?;
        Ok(self.roles.lock().clone())
    }

    async fn add_role(&self, member: &MemberId, role: &RoleId) -> Result<(), PlatformError> {
        self.check(Op::AddRole)?;
        self.update_member(member, |m| {
            if !m.roles.contains(role) {
                m.roles.push(role.clone());
            }
        })?;
        self.record(Call::AddRole {
            member: member.clone(),
            role: role.clone(),
        });
        Ok(())
    }

    async fn remove_role(&self, member: &MemberId, role: &RoleId) -> Result<(), PlatformError> {
        self.check(Op::RemoveRole)?;
        self.update_member(member, |m| m.roles.retain(|r| r != role))?;
        self.record(Call::RemoveRole {
            member: member.clone(),
            role: role.clone(),
        });
        Ok(())
    }

    async fn set_roles(&self, member: &MemberId, roles: &[RoleId]) -> Result<(), PlatformError> {
        self.check(Op::SetRoles)?;
        self.update_member(member, |m| m.roles = roles.to_vec())?;
        self.record(Call::SetRoles {
            member: member.clone(),
            roles: roles.to_vec(),
        });
        Ok(())
    }

    async fn kick(&self, member: &MemberId, reason: &str) -> Result<(), PlatformError> {
        self.check(Op::Kick)?;
        self.members.lock().retain(|m| &m.id != member);
        self.record(Call::Kick {
            member: member.clone(),
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn send_direct(&self, member: &MemberId, text: &str) -> Result<(), PlatformError> {
        self.check(Op::Direct)?;
        self.record(Call::Direct {
            member: member.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_channel(&self, channel: &ChannelId, text: &str) -> Result<(), PlatformError> {
        self.check(Op::Channel)?;
        self.record(Call::Channel {
            channel: channel.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn reply(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        text: &str,
    ) -> Result<(), PlatformError> {
        self.check(Op::Reply)?;
        self.record(Call::Reply {
            channel: channel.clone(),
            message: message.clone(),
            text: text.to_string(),
        });
        Ok(())
    }
}

/// Standard server roles, one per ladder rung
#[must_use]
pub fn server_roles() -> Vec<Role> {
    vec![
        Role::new(ADMIN, "Admin"),
        Role::new(SENIOR_ADMIN, "Senior Admin"),
        Role::new(COMMANDER, "Commander"),
        Role::new(VICE_COMMANDER, "Vice-Commander"),
        Role::new(ELITE, "Elite"),
        Role::new(RANGER, "Ranger"),
        Role::new(RECRUIT, "Recruit"),
        Role::new(GUEST, "Guest"),
    ]
}

/// Configuration matching [`server_roles`]
///
/// Ranks: admin-1 = 0, admin-2 = 1, commander = 2, vice-commander = 3,
/// elite = 4, ranger = 5, recruit = 6, guest = 7.
#[must_use]
pub fn test_config() -> BotConfig {
    BotConfig::new(
        RoleConfig {
            admin: vec![ADMIN.into(), SENIOR_ADMIN.into()],
            commander: COMMANDER.into(),
            vice_commander: VICE_COMMANDER.into(),
            elite: ELITE.into(),
            ranger: RANGER.into(),
            recruit: RECRUIT.into(),
            guest: GUEST.into(),
        },
        ChannelConfig {
            audit_log: AUDIT_LOG.into(),
            recruit_chat: RECRUIT_CHAT.into(),
            announcements: ANNOUNCEMENTS.into(),
        },
    )
}

/// Member with the given roles
#[must_use]
pub fn member(id: &str, display_name: &str, roles: &[&str]) -> Member {
    Member::new(id, display_name)
        .with_roles(roles.iter().copied())
        .with_tag(format!("{}#0001", display_name.to_lowercase()))
}

/// Message from `author` in the command channel
#[must_use]
pub fn message(id: &str, author: &Member, content: &str) -> InboundMessage {
    InboundMessage::from_member(id, COMMAND_CHANNEL, author.clone(), content)
}

/// Router wired to a [`FakePlatform`] and a [`MemoryStore`]
#[derive(Debug)]
pub struct TestBot {
    pub router: CommandRouter,
    pub platform: Arc<FakePlatform>,
    pub store: Arc<MemoryStore>,
    next_message: AtomicU64,
}

impl TestBot {
    /// Bot over a server with `members`
    #[must_use]
    pub fn new(members: Vec<Member>) -> Self {
        Self::with_config(test_config(), members)
    }

    /// Bot with a custom configuration
    ///
    /// # Panics
    /// Panics if `config` does not validate.
    #[must_use]
    pub fn with_config(config: BotConfig, members: Vec<Member>) -> Self {
        let platform = Arc::new(FakePlatform::new(members));
        let store = Arc::new(MemoryStore::new());
        let router = CommandRouter::new(config, platform.clone(), store.clone())
            .expect("test config is valid");
        Self {
            router,
            platform,
            store,
            next_message: AtomicU64::new(1),
        }
    }

    /// Build a message from `author` in the command channel
    #[must_use]
    pub fn message(&self, author: &Member, content: &str) -> InboundMessage {
        let id = self.next_message.fetch_add(1, Ordering::Relaxed);
        message(&format!("msg-{id}"), author, content)
    }

    /// Deliver a message from `author` and wait for its handler to finish
    pub async fn say(&self, author: &Member, content: &str) {
        let message = self.message(author, content);
        self.router.handle_message(&message).await;
    }

    /// Spawn a handler for a message from `author` without waiting
    pub fn spawn_say(&self, author: &Member, content: &str) -> tokio::task::JoinHandle<()> {
        let message = self.message(author, content);
        let router = self.router.clone();
        tokio::spawn(async move { router.handle_message(&message).await })
    }

    /// Yield until a confirmation from `author` is pending in the command channel
    ///
    /// # Panics
    /// Panics if nothing becomes pending after many scheduler turns.
    pub async fn wait_for_prompt(&self, author: &Member) {
        let key = PendingKey::new(COMMAND_CHANNEL.into(), author.id.clone());
        for _ in 0..1_000 {
            if self.router.context().confirmations().is_pending(&key) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("no confirmation became pending for {}", author.id);
    }

    /// Most recent reply text
    #[must_use]
    pub fn last_reply(&self) -> Option<String> {
        self.platform.replies().pop()
    }
}
