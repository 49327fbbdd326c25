//! Muster Core - rank ladder bot logic
//!
//! Keeps a community's linear role ladder in order:
//! - Grants the guest role to newcomers
//! - Promotes and demotes members one rank at a time
//! - Tracks when recruits entered probation
//! - Answers probation status checks and relays announcements
//!
//! The chat service itself sits behind [`ChatPlatform`].
//!
//! # Example
//!
//! ```rust,ignore
//! use muster_core::{BotConfig, CommandRouter, JsonFileStore};
//! use std::sync::Arc;
//!
//! # async fn example(platform: Arc<dyn muster_core::ChatPlatform>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = BotConfig::load("muster.toml")?;
//! let store = Arc::new(JsonFileStore::open(&config.store_path));
//! let router = CommandRouter::new(config, platform, store)?;
//!
//! router.handle_event(muster_core::GatewayEvent::Ready).await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod command;
pub mod config;
pub mod confirm;
pub mod context;
pub mod demotion;
pub mod error;
pub mod hierarchy;
pub mod notify;
pub mod onboarding;
pub mod platform;
pub mod probation;
pub mod promotion;
pub mod router;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use command::{parse_command, resolve_target, Command};
pub use config::{BotConfig, ChannelConfig, CommandConfig, ProbationConfig, RoleConfig};
pub use confirm::{Choice, ConfirmationRegistry, PendingKey};
pub use context::BotContext;
pub use demotion::{Demotion, DemotionEngine};
pub use error::{CommandError, ConfigError, ErrorKind, PlatformError, RankAction, StoreError};
pub use hierarchy::{Rank, RankedRole, RoleHierarchy};
pub use notify::Notifier;
pub use onboarding::Onboarding;
pub use platform::ChatPlatform;
pub use probation::{days_left, ProbationStatus};
pub use promotion::{Promotion, PromotionEngine};
pub use router::CommandRouter;
pub use store::{JsonFileStore, MemoryStore, PromotionRecord, PromotionStore};
pub use types::{ChannelId, GatewayEvent, InboundMessage, Member, MemberId, MessageId, Role, RoleId};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Muster Core
    pub use crate::{
        BotConfig, ChatPlatform, CommandRouter, GatewayEvent, InboundMessage, Member, MemberId,
        PromotionStore, RoleHierarchy, RoleId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
