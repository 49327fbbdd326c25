//! Gateway error types

use muster_core::ConfigError;
use thiserror::Error;

/// Result type for gateway setup
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors raised while wiring the bot to the platform
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Settings file failed to load or validate
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Token environment variable unset or empty
    #[error("bot token variable {0} is not set")]
    MissingToken(String),

    /// Token cannot be sent as a header
    #[error("bot token from {0} is not a valid header value")]
    InvalidToken(String),

    /// HTTP client could not be built
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Listener or socket failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
