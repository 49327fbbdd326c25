//! Muster Gateway - platform wiring for the Muster bot
//!
//! Connects [`muster_core`] to Discord:
//! - [`discord::DiscordRest`] implements `ChatPlatform` over the REST API
//! - [`intake`] receives relayed gateway events over HTTP
//! - [`settings::Settings`] extends the bot configuration with connection settings
//! - [`telemetry::init`] installs the tracing subscriber

#![warn(unreachable_pub)]

pub mod discord;
pub mod error;
pub mod intake;
pub mod report;
pub mod settings;
pub mod telemetry;

pub use discord::DiscordRest;
pub use error::{GatewayError, GatewayResult};
pub use settings::{GatewayConfig, Settings};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
