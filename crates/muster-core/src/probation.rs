//! Probation status check
//!
//! Recruits ask how much of their review window is left. The window starts
//! at the recorded promotion timestamp.

use crate::context::BotContext;
use crate::error::CommandError;
use crate::store::format_timestamp;
use crate::types::InboundMessage;
use chrono::{DateTime, Duration, Utc};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Where a recruit stands in the review window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbationStatus {
    /// Whole days left before review
    Remaining {
        /// Days left (always positive)
        days: i64,
    },
    /// Window has elapsed; command decides
    Expired,
}

impl ProbationStatus {
    /// Evaluate the window that started at `promoted_at`
    #[must_use]
    pub fn evaluate(promoted_at: DateTime<Utc>, now: DateTime<Utc>, window_days: i64) -> Self {
        let days = days_left(promoted_at, now, window_days);
        if days > 0 {
            Self::Remaining { days }
        } else {
            Self::Expired
        }
    }
}

/// Floor of the days between `now` and the end of the window
///
/// A window whose end falls outside the representable range saturates to
/// `i64::MAX` (or `i64::MIN` for a negative window).
#[must_use]
pub fn days_left(promoted_at: DateTime<Utc>, now: DateTime<Utc>, window_days: i64) -> i64 {
    let deadline = Duration::try_days(window_days)
        .and_then(|window| promoted_at.checked_add_signed(window));
    match deadline {
        Some(deadline) => (deadline - now).num_milliseconds().div_euclid(MILLIS_PER_DAY),
        None if window_days < 0 => i64::MIN,
        None => i64::MAX,
    }
}

/// Answer a status-check message
///
/// # Errors
/// Returns `CommandError::Platform` if the reply cannot be delivered.
pub async fn check_status(ctx: &BotContext, origin: &InboundMessage) -> Result<(), CommandError> {
    let Some(member) = origin.member.as_ref() else {
        ctx.reply(origin, "I can't find information about your account.")
            .await?;
        return Ok(());
    };

    let config = ctx.config();
    if !member.has_role(&config.roles.recruit) {
        ctx.reply(
            origin,
            "This command is only available to members with the recruit role.",
        )
        .await?;
        return Ok(());
    }

    let Some(promoted_at) = ctx.store().get(&member.id) else {
        ctx.reply(
            origin,
            "Could not find your promotion date. Contact the administration, \
             preferably with a ticket in the applications channel.",
        )
        .await?;
        return Ok(());
    };

    match ProbationStatus::evaluate(promoted_at, Utc::now(), config.probation.window_days) {
        ProbationStatus::Remaining { days } => {
            ctx.reply(
                origin,
                &format!(
                    "You have {days} days left until a possible promotion and acceptance \
                     into the main roster. Show what you can do!"
                ),
            )
            .await?;
        }
        ProbationStatus::Expired => {
            ctx.reply(
                origin,
                "Your probation window is over. Senior command has been notified; \
                 wait for their decision.",
            )
            .await?;
            ctx.notifier()
                .notify(
                    &config.channels.audit_log,
                    &format!(
                        "Probation review due for {} ({}), recruit since {}",
                        member.id.mention(),
                        member.display_name,
                        format_timestamp(&promoted_at)
                    ),
                )
                .await;
            tracing::info!(member = %member.id, "probation window expired");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn fresh_recruit_has_full_window() {
        assert_eq!(days_left(at(1, 12), at(1, 12), 14), 14);
        assert_eq!(
            ProbationStatus::evaluate(at(1, 12), at(1, 12), 14),
            ProbationStatus::Remaining { days: 14 }
        );
    }

    #[test]
    fn partial_days_round_down() {
        // 13 days and 12 hours left
        assert_eq!(days_left(at(1, 12), at(2, 0), 14), 13);
        // 12 hours left
        assert_eq!(days_left(at(1, 12), at(15, 0), 14), 0);
        assert_eq!(
            ProbationStatus::evaluate(at(1, 12), at(15, 0), 14),
            ProbationStatus::Expired
        );
    }

    #[test]
    fn exactly_at_deadline_is_expired() {
        let now = Utc::now();
        let promoted = now - Duration::days(14);
        assert!(days_left(promoted, now, 14) <= 0);
        assert_eq!(ProbationStatus::evaluate(promoted, now, 14), ProbationStatus::Expired);
    }

    #[test]
    fn overdue_is_negative_and_floored() {
        // 1 day and 12 hours overdue floors to -2
        assert_eq!(days_left(at(1, 0), at(16, 12), 14), -2);
    }

    #[test]
    fn oversized_window_saturates() {
        assert_eq!(days_left(at(1, 12), at(2, 0), 200_000_000), i64::MAX);
        assert_eq!(days_left(at(1, 12), at(2, 0), i64::MAX), i64::MAX);
        assert_eq!(days_left(at(1, 12), at(2, 0), -200_000_000), i64::MIN);
        assert_eq!(
            ProbationStatus::evaluate(at(1, 12), at(2, 0), 200_000_000),
            ProbationStatus::Remaining { days: i64::MAX }
        );
        assert_eq!(
            ProbationStatus::evaluate(at(1, 12), at(2, 0), -200_000_000),
            ProbationStatus::Expired
        );
    }
}
