//! Promotion and stepped demotion through the router
//!
use chrono::{Duration, Utc};
use muster_core::PromotionStore;
use muster_test_utils::*;
use pretty_assertions::assert_eq;

struct Roster {
    alice: muster_core::Member,
    bob: muster_core::Member,
    carol: muster_core::Member,
    heidi: muster_core::Member,
}

fn roster() -> (TestBot, Roster) {
    let roster = Roster {
        alice: member("100", "Alice", &[ADMIN]),
        bob: member("101", "Bob", &[COMMANDER]),
        carol: member("103", "Carol", &[ELITE]),
        heidi: member("107", "Heidi", &[]),
    };
    let bot = TestBot::new(vec![
        roster.alice.clone(),
        roster.bob.clone(),
        member("102", "Grace", &[VICE_COMMANDER]),
        roster.carol.clone(),
        member("104", "Dave", &[RANGER]),
        member("105", "Erin", &[RECRUIT]),
        member("106", "Frank", &[GUEST]),
        roster.heidi.clone(),
    ]);
    (bot, roster)
}

fn roles_of(bot: &TestBot, id: &str) -> Vec<String> {
    bot.platform
        .member(id)
        .expect("member exists")
        .roles
        .iter()
        .map(|r| r.as_str().to_string())
        .collect()
}

#[tokio::test]
async fn test_guest_promotion_starts_probation() {
    let (bot, r) = roster();
    let before = Utc::now();

    bot.say(&r.alice, "!Frank promote").await;

    assert_eq!(roles_of(&bot, "106"), vec![GUEST, RECRUIT]);
    assert_eq!(bot.last_reply().as_deref(), Some("Frank was promoted to Recruit."));
    assert_eq!(
        bot.platform.channel_messages(ANNOUNCEMENTS),
        vec!["Player <@106> has been promoted to Recruit".to_string()]
    );

    let welcome = bot.platform.channel_messages(RECRUIT_CHAT);
    assert_eq!(welcome.len(), 1);
    assert!(welcome[0].starts_with("Player <@106> is now a recruit."));
    assert!(welcome[0].contains("14 days"));
    assert!(welcome[0].contains("!recruit"));

    let started = bot.store.get(&"106".into()).expect("timestamp recorded");
    assert!(started >= before - Duration::seconds(1));
    assert!(started <= Utc::now() + Duration::seconds(1));
    assert_eq!(bot.store.save_count(), 1);
}

#[tokio::test]
async fn test_promotion_adds_role_without_removing_old_one() {
    let (bot, r) = roster();

    bot.say(&r.bob, "!Dave promote").await;

    assert_eq!(roles_of(&bot, "104"), vec![RANGER, ELITE]);
    assert_eq!(
        bot.platform.mutations(),
        vec![Call::AddRole {
            member: "104".into(),
            role: ELITE.into(),
        }]
    );
    assert!(bot.store.records().is_empty());
    assert_eq!(bot.store.save_count(), 0);
    assert!(bot.platform.channel_messages(RECRUIT_CHAT).is_empty());
}

#[tokio::test]
async fn test_target_lookup_ignores_case_and_action_word_case() {
    let (bot, r) = roster();

    bot.say(&r.bob, "!dav PROMOTE").await;

    assert_eq!(roles_of(&bot, "104"), vec![RANGER, ELITE]);
}

#[tokio::test]
async fn test_commander_can_promote_vice_commander() {
    let (bot, r) = roster();

    bot.say(&r.bob, "!Grace promote").await;

    assert_eq!(roles_of(&bot, "102"), vec![VICE_COMMANDER, COMMANDER]);
    assert_eq!(bot.last_reply().as_deref(), Some("Grace was promoted to Commander."));
}

#[tokio::test]
async fn test_equal_rank_cannot_promote() {
    let (bot, r) = roster();

    bot.say(&r.bob, "!Bob promote").await;

    assert_eq!(
        bot.last_reply().as_deref(),
        Some("You cannot promote a member with the same or a higher role.")
    );
    assert!(bot.platform.mutations().is_empty());
}

#[tokio::test]
async fn test_lower_rank_cannot_promote_higher() {
    let (bot, r) = roster();

    bot.say(&r.carol, "!Bob promote").await;

    assert_eq!(
        bot.last_reply().as_deref(),
        Some("You cannot promote a member with the same or a higher role.")
    );
    assert_eq!(roles_of(&bot, "101"), vec![COMMANDER]);
}

#[tokio::test]
async fn test_demotion_replaces_role() {
    let (bot, r) = roster();

    bot.say(&r.bob, "!Carol demote").await;

    assert_eq!(roles_of(&bot, "103"), vec![RANGER]);
    assert_eq!(
        bot.platform.mutations(),
        vec![
            Call::AddRole {
                member: "103".into(),
                role: RANGER.into(),
            },
            Call::RemoveRole {
                member: "103".into(),
                role: ELITE.into(),
            },
        ]
    );
    assert_eq!(bot.last_reply().as_deref(), Some("Carol was demoted to Ranger."));
    assert_eq!(
        bot.platform.channel_messages(ANNOUNCEMENTS),
        vec!["Player <@103> has been demoted to Ranger".to_string()]
    );
}

#[tokio::test]
async fn test_ranger_demotion_does_not_start_probation() {
    let (bot, r) = roster();

    bot.say(&r.alice, "!Dave demote").await;

    assert_eq!(roles_of(&bot, "104"), vec![RECRUIT]);
    assert!(bot.store.records().is_empty());
}

#[tokio::test]
async fn test_guest_cannot_be_demoted_further() {
    let (bot, r) = roster();

    bot.say(&r.alice, "!Frank demote").await;

    assert_eq!(
        bot.last_reply().as_deref(),
        Some("Cannot demote any further. Escalate to senior command.")
    );
    assert!(bot.platform.mutations().is_empty());
}

#[tokio::test]
async fn test_lower_rank_cannot_demote() {
    let (bot, r) = roster();

    bot.say(&r.carol, "!Bob demote").await;

    assert_eq!(
        bot.last_reply().as_deref(),
        Some("Refer to command. This is not yours to decide yet.")
    );
    assert!(bot.platform.mutations().is_empty());
}

#[tokio::test]
async fn test_unknown_target() {
    let (bot, r) = roster();

    bot.say(&r.alice, "!Zed promote").await;

    assert_eq!(
        bot.last_reply().as_deref(),
        Some("No player with that nickname was found.")
    );
}

#[tokio::test]
async fn test_unranked_members_are_rejected() {
    let (bot, r) = roster();
    let unranked = "Could not determine roles. Ask an administrator to check the role setup.";

    bot.say(&r.heidi, "!Frank promote").await;
    assert_eq!(bot.last_reply().as_deref(), Some(unranked));

    bot.say(&r.alice, "!Heidi promote").await;
    assert_eq!(bot.last_reply().as_deref(), Some(unranked));

    assert!(bot.platform.mutations().is_empty());
}

#[tokio::test]
async fn test_malformed_command_gets_usage() {
    let (bot, r) = roster();

    bot.say(&r.alice, "!Frank").await;
    bot.say(&r.alice, "!Frank elevate").await;

    let hint = "Specify a command, for example: '! <player> promote' or '! <player> demote'";
    assert_eq!(bot.platform.replies(), vec![hint.to_string(), hint.to_string()]);
    assert!(bot.platform.mutations().is_empty());
}

#[tokio::test]
async fn test_missing_server_role() {
    let (bot, r) = roster();
    bot.platform.delete_role(ELITE);

    bot.say(&r.bob, "!Dave promote").await;

    assert_eq!(
        bot.last_reply().as_deref(),
        Some("The role for the new rank was not found.")
    );
    assert_eq!(roles_of(&bot, "104"), vec![RANGER]);
}

#[tokio::test]
async fn test_platform_failure_is_reported() {
    let (bot, r) = roster();
    bot.platform.fail(Op::AddRole);

    bot.say(&r.bob, "!Dave promote").await;

    assert_eq!(
        bot.last_reply().as_deref(),
        Some("Something went wrong while running the command. Please tell an administrator.")
    );
    assert!(bot.platform.channel_messages(ANNOUNCEMENTS).is_empty());
}

#[tokio::test]
async fn test_demotion_to_missing_server_role() {
    let (bot, r) = roster();
    bot.platform.delete_role(RANGER);

    bot.say(&r.bob, "!Carol demote").await;

    assert_eq!(
        bot.last_reply().as_deref(),
        Some("The role for the new rank was not found.")
    );
    assert_eq!(roles_of(&bot, "103"), vec![ELITE]);
    assert!(bot.platform.mutations().is_empty());
}

#[tokio::test]
async fn test_failed_role_removal_leaves_both_roles() {
    let (bot, r) = roster();
    bot.platform.fail(Op::RemoveRole);

    bot.say(&r.bob, "!Carol demote").await;

    assert_eq!(roles_of(&bot, "103"), vec![ELITE, RANGER]);
    assert_eq!(
        bot.last_reply().as_deref(),
        Some("Something went wrong while running the command. Please tell an administrator.")
    );
    assert!(bot.platform.channel_messages(ANNOUNCEMENTS).is_empty());
}

#[tokio::test]
async fn test_failed_announcement_does_not_fail_promotion() {
    let (bot, r) = roster();
    bot.platform.fail(Op::Channel);

    bot.say(&r.bob, "!Dave promote").await;

    assert_eq!(roles_of(&bot, "104"), vec![RANGER, ELITE]);
    assert_eq!(bot.last_reply().as_deref(), Some("Dave was promoted to Elite."));
}

#[tokio::test]
async fn test_custom_command_words() {
    let mut config = test_config();
    config.commands.prefix = "?".to_string();
    config.commands.promote = "up".to_string();
    let alice = member("100", "Alice", &[ADMIN]);
    let bot = TestBot::with_config(
        config,
        vec![alice.clone(), member("104", "Dave", &[RANGER])],
    );

    bot.say(&alice, "!Dave promote").await;
    assert!(bot.platform.calls().is_empty());

    bot.say(&alice, "?Dave up").await;
    assert_eq!(roles_of(&bot, "104"), vec![RANGER, ELITE]);
}
