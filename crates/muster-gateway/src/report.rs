//! Operator reports printed by the `muster` CLI

use muster_core::store::format_timestamp;
use muster_core::{BotConfig, ConfigError, PromotionStore, RoleConfig, RoleHierarchy, RoleId};
use std::fmt::Write as _;

/// Human-readable summary of a validated configuration
///
/// # Errors
/// Returns `ConfigError` if the configuration does not validate.
pub fn describe_config(config: &BotConfig) -> Result<String, ConfigError> {
    config.validate()?;
    let hierarchy = RoleHierarchy::from_config(&config.roles)?;

    let mut out = String::from("Rank ladder (0 = most privileged):\n");
    for (rank, role) in hierarchy.iter() {
        let _ = writeln!(
            out,
            "  {:>2}  {:<24} {}",
            rank.index(),
            role.as_str(),
            role_label(&config.roles, role)
        );
    }
    let _ = writeln!(
        out,
        "Channels: audit_log={} recruit_chat={} announcements={}",
        config.channels.audit_log, config.channels.recruit_chat, config.channels.announcements
    );
    let _ = writeln!(
        out,
        "Commands: prefix={:?} status={:?} announce={:?} promote={:?} demote={:?}",
        config.commands.prefix,
        config.commands.status,
        config.commands.announce,
        config.commands.promote,
        config.commands.demote
    );
    let _ = writeln!(
        out,
        "Probation: {} days, confirmation timeout {}s, records in {}",
        config.probation.window_days,
        config.probation.confirmation_timeout_secs,
        config.store_path.display()
    );
    Ok(out)
}

fn role_label(roles: &RoleConfig, role: &RoleId) -> &'static str {
    if roles.admin.contains(role) {
        "admin"
    } else if role == &roles.commander {
        "commander"
    } else if role == &roles.vice_commander {
        "vice-commander"
    } else if role == &roles.elite {
        "elite"
    } else if role == &roles.ranger {
        "ranger"
    } else if role == &roles.recruit {
        "recruit (probation)"
    } else if role == &roles.guest {
        "guest"
    } else {
        ""
    }
}

/// Stored promotion records as a pretty JSON object
///
/// # Errors
/// Returns the encoder error; a map of strings always encodes in practice.
pub fn records_json(store: &dyn PromotionStore) -> serde_json::Result<String> {
    let map: serde_json::Map<String, serde_json::Value> = store
        .records()
        .into_iter()
        .map(|r| {
            (
                r.member_id.to_string(),
                serde_json::Value::String(format_timestamp(&r.promoted_at)),
            )
        })
        .collect();
    serde_json::to_string_pretty(&map)
}
