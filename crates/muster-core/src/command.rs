//! Command parsing
//!
//! Turns a message body into a typed [`Command`]. Parsing is pure and knows
//! nothing about the platform; dispatch lives in [`crate::router`].

use crate::config::CommandConfig;
use crate::error::RankAction;
use crate::types::Member;

/// A recognised chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Probation status check for the author
    ProbationStatus,
    /// Promote or demote the member matching `query`
    ChangeRank {
        /// Display-name substring
        query: String,
        /// Direction
        action: RankAction,
    },
    /// Broadcast free text to the announcements channel
    Announce {
        /// Text after the trigger, trimmed (may be empty)
        text: String,
    },
    /// Command prefix matched but arguments did not
    Usage,
}

/// Parse a message body
///
/// Returns `None` for messages matching no trigger. The status trigger is
/// tried before the generic prefix because it usually starts with it.
#[must_use]
pub fn parse_command(content: &str, commands: &CommandConfig) -> Option<Command> {
    if content.starts_with(&commands.status) {
        return Some(Command::ProbationStatus);
    }

    if let Some(rest) = content.strip_prefix(&commands.announce) {
        return Some(Command::Announce {
            text: rest.trim().to_string(),
        });
    }

    let rest = content.strip_prefix(&commands.prefix)?;
    let mut args = rest.split_whitespace();
    let (Some(query), Some(word)) = (args.next(), args.next()) else {
        return Some(Command::Usage);
    };

    let word = word.to_lowercase();
    let action = if word == commands.promote.to_lowercase() {
        RankAction::Promote
    } else if word == commands.demote.to_lowercase() {
        RankAction::Demote
    } else {
        return Some(Command::Usage);
    };

    Some(Command::ChangeRank {
        query: query.to_string(),
        action,
    })
}

/// Find the first member whose display name contains `query`, ignoring case
///
/// Ties resolve to the first match in `members` order.
#[must_use]
pub fn resolve_target<'a>(members: &'a [Member], query: &str) -> Option<&'a Member> {
    let needle = query.to_lowercase();
    members
        .iter()
        .find(|m| m.display_name.to_lowercase().contains(&needle))
}

/// Usage hint for malformed rank commands
#[must_use]
pub fn usage_hint(commands: &CommandConfig) -> String {
    format!(
        "Specify a command, for example: '{p} <player> {up}' or '{p} <player> {down}'",
        p = commands.prefix,
        up = commands.promote,
        down = commands.demote,
    )
}
