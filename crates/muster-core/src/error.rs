//! Error types for Muster Core
//!
//! Provides error handling for:
//! - Command failures surfaced to the invoking member
//! - Platform (chat SDK) call failures
//! - Promotion record persistence
//! - Configuration loading and validation

use crate::types::RoleId;
use std::path::PathBuf;

/// Failure classes for command handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Target member, role or record missing
    NotFound,
    /// Actor lacks the rank for the operation
    Authorization,
    /// No further rank in the requested direction
    Boundary,
    /// Platform or storage call rejected
    External,
    /// Confirmation dialog abandoned
    Timeout,
}

/// Main command error type
///
/// Every variant maps to exactly one user-facing reply via
/// [`CommandError::user_message`].
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Command issued outside the server
    #[error("command issued outside the server")]
    NotInGuild,

    /// No member matched the display-name query
    #[error("no member matches '{0}'")]
    MemberNotFound(String),

    /// Actor or target holds no ranked role
    #[error("unable to resolve ranks for actor or target")]
    Unranked,

    /// Role for the requested rank does not exist on the server
    #[error("role {0} not found on the server")]
    RoleNotFound(RoleId),

    /// Actor is not strictly above the target
    #[error("actor rank {actor} does not outrank target rank {target}")]
    InsufficientRank {
        /// Actor rank index
        actor: usize,
        /// Target rank index
        target: usize,
        /// Attempted direction
        action: RankAction,
    },

    /// Probation demotion requires an administrative role
    #[error("administrative role required")]
    AdminRequired,

    /// Target is already at the top of the ladder
    #[error("no higher rank configured")]
    NoHigherRank,

    /// Target is already at the bottom of the ladder
    #[error("no lower rank configured")]
    NoLowerRank,

    /// No qualifying confirmation reply arrived in time
    #[error("confirmation timed out after {duration_secs}s")]
    ConfirmationTimedOut {
        /// Configured wait
        duration_secs: u64,
    },

    /// Platform call failed
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Promotion record could not be persisted
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Direction of a rank change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankAction {
    /// One rank up
    Promote,
    /// One rank down
    Demote,
}

impl std::fmt::Display for RankAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Promote => f.write_str("promote"),
            Self::Demote => f.write_str("demote"),
        }
    }
}

impl CommandError {
    /// Classify error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInGuild | Self::MemberNotFound(_) | Self::Unranked | Self::RoleNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InsufficientRank { .. } | Self::AdminRequired => ErrorKind::Authorization,
            Self::NoHigherRank | Self::NoLowerRank => ErrorKind::Boundary,
            Self::ConfirmationTimedOut { .. } => ErrorKind::Timeout,
            Self::Platform(_) | Self::Store(_) => ErrorKind::External,
        }
    }

    /// Check if the failure was caused by the request rather than the system
    #[inline]
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        !matches!(self.kind(), ErrorKind::External)
    }

    /// Reply text shown to the member who issued the command
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotInGuild => "This command is only available inside the server.".to_string(),
            Self::MemberNotFound(_) => "No player with that nickname was found.".to_string(),
            Self::Unranked => {
                "Could not determine roles. Ask an administrator to check the role setup."
                    .to_string()
            }
            Self::RoleNotFound(_) => "The role for the new rank was not found.".to_string(),
            Self::InsufficientRank {
                action: RankAction::Promote,
                ..
            } => "You cannot promote a member with the same or a higher role.".to_string(),
            Self::InsufficientRank {
                action: RankAction::Demote,
                ..
            } => "Refer to command. This is not yours to decide yet.".to_string(),
            Self::AdminRequired => "You are not senior enough to demote recruits.".to_string(),
            Self::NoHigherRank => "Cannot promote any further.".to_string(),
            Self::NoLowerRank => {
                "Cannot demote any further. Escalate to senior command.".to_string()
            }
            Self::ConfirmationTimedOut { .. } => "Took too long to decide.".to_string(),
            Self::Platform(_) | Self::Store(_) => {
                "Something went wrong while running the command. Please tell an administrator."
                    .to_string()
            }
        }
    }
}

/// Chat platform call errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlatformError {
    /// Referenced entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Platform refused the operation
    #[error("rejected with status {status}: {message}")]
    Rejected {
        /// HTTP-like status code
        status: u16,
        /// Platform-provided detail
        message: String,
    },

    /// Connection or decoding failure
    #[error("transport error: {0}")]
    Transport(String),
}

impl PlatformError {
    /// Create rejection error
    #[inline]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}

/// Promotion store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error writing the store file
    #[error("io error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Records could not be encoded
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the expected shape
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Role appears twice in the hierarchy
    #[error("role {0} appears more than once in the hierarchy")]
    DuplicateRole(RoleId),

    /// Semantic validation failed
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(CommandError::MemberNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(CommandError::AdminRequired.kind(), ErrorKind::Authorization);
        assert_eq!(CommandError::NoLowerRank.kind(), ErrorKind::Boundary);
        assert_eq!(
            CommandError::ConfirmationTimedOut { duration_secs: 30 }.kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            CommandError::from(PlatformError::Transport("reset".into())).kind(),
            ErrorKind::External
        );
    }

    #[test]
    fn external_errors_hide_detail_from_users() {
        let err = CommandError::from(PlatformError::rejected(403, "Missing Permissions"));
        assert!(!err.is_user_error());
        assert!(!err.user_message().contains("Missing Permissions"));
        assert!(err.to_string().contains("Missing Permissions"));
    }

    #[test]
    fn rank_messages_depend_on_direction() {
        let promote = CommandError::InsufficientRank {
            actor: 3,
            target: 2,
            action: RankAction::Promote,
        };
        let demote = CommandError::InsufficientRank {
            actor: 3,
            target: 2,
            action: RankAction::Demote,
        };
        assert_ne!(promote.user_message(), demote.user_message());
    }
}
