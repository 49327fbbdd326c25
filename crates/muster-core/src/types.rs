//! Core types for Muster
//!
//! Defines the platform-facing data the bot reads:
//! - Identifiers for members, roles, channels and messages
//! - Member and role snapshots
//! - Inbound events delivered by the platform

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create identifier from any string-like value
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

snowflake_id!(
    /// Platform member (user) identifier
    MemberId
);
snowflake_id!(
    /// Platform role identifier
    RoleId
);
snowflake_id!(
    /// Platform channel identifier
    ChannelId
);
snowflake_id!(
    /// Platform message identifier
    MessageId
);

impl MemberId {
    /// Mention markup that pings this member
    #[inline]
    #[must_use]
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

/// Snapshot of a server member as reported by the platform
///
/// The bot never owns members; it reads their roles and asks the platform
/// to change them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Member identifier
    pub id: MemberId,
    /// Server display name (nickname or account name)
    pub display_name: String,
    /// Account tag used in audit lines
    #[serde(default)]
    pub tag: String,
    /// Assigned role identifiers, in platform order
    #[serde(default)]
    pub roles: Vec<RoleId>,
    /// Whether the account is a bot
    #[serde(default)]
    pub bot: bool,
}

impl Member {
    /// Create member with no roles
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<MemberId>, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            id: id.into(),
            tag: display_name.clone(),
            display_name,
            roles: Vec::new(),
            bot: false,
        }
    }

    /// With assigned roles
    #[inline]
    #[must_use]
    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleId>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// With account tag
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Check if member holds a role
    #[inline]
    #[must_use]
    pub fn has_role(&self, role: &RoleId) -> bool {
        self.roles.contains(role)
    }
}

/// Server role as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier
    pub id: RoleId,
    /// Display name
    pub name: String,
}

impl Role {
    /// Create role
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<RoleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A chat message delivered to the bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Message identifier (used for replies)
    pub id: MessageId,
    /// Channel the message was posted in
    pub channel_id: ChannelId,
    /// Author identifier
    pub author_id: MemberId,
    /// Whether the author is a bot account
    #[serde(default)]
    pub author_is_bot: bool,
    /// Author's server membership; absent for direct messages
    #[serde(default)]
    pub member: Option<Member>,
    /// Raw message body
    pub content: String,
}

impl InboundMessage {
    /// Create a server message authored by `member`
    #[must_use]
    pub fn from_member(
        id: impl Into<MessageId>,
        channel_id: impl Into<ChannelId>,
        member: Member,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            author_id: member.id.clone(),
            author_is_bot: member.bot,
            member: Some(member),
            content: content.into(),
        }
    }
}

/// Events the platform delivers to the bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// Connection established
    Ready,
    /// A member joined the server
    MemberJoined {
        /// The new member
        member: Member,
    },
    /// A message was posted
    MessageCreated {
        /// The message
        message: InboundMessage,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_markup() {
        assert_eq!(MemberId::new("123").mention(), "<@123>");
    }

    #[test]
    fn member_builder() {
        let member = Member::new("1", "Scout").with_roles(["a", "b"]).with_tag("scout#1");
        assert!(member.has_role(&RoleId::from("a")));
        assert!(!member.has_role(&RoleId::from("c")));
        assert_eq!(member.tag, "scout#1");
    }

    #[test]
    fn gateway_event_wire_format() {
        let json = r#"{
            "type": "message_created",
            "message": {
                "id": "m1",
                "channel_id": "c1",
                "author_id": "u1",
                "content": "!recruit"
            }
        }"#;
        let event: GatewayEvent = serde_json::from_str(json).unwrap();
        match event {
            GatewayEvent::MessageCreated { message } => {
                assert_eq!(message.author_id.as_str(), "u1");
                assert!(message.member.is_none());
                assert!(!message.author_is_bot);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
