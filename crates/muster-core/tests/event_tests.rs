//! Status checks, announcements, onboarding and event intake
//!
use chrono::{Duration, Utc};
use muster_core::{
    CommandRouter, ConfigError, GatewayEvent, InboundMessage, Member, MemoryStore, PromotionStore,
    RoleId,
};
use muster_test_utils::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn setup() -> (TestBot, Member, Member, Member) {
    let alice = member("100", "Alice", &[ADMIN]);
    let erin = member("105", "Erin", &[RECRUIT]);
    let frank = member("106", "Frank", &[GUEST]);
    let newbie = member("300", "Newbie", &[]);
    let bot = TestBot::new(vec![alice.clone(), erin.clone(), frank.clone(), newbie]);
    (bot, alice, erin, frank)
}

#[tokio::test]
async fn test_status_for_recruit_with_days_left() {
    let (bot, _, erin, _) = setup();
    bot.store.set(
        erin.id.clone(),
        Utc::now() - Duration::days(3) - Duration::hours(1),
    );

    bot.say(&erin, "!recruit").await;

    let reply = bot.last_reply().unwrap();
    assert!(reply.starts_with("You have 10 days left"), "{reply}");
    assert!(bot.platform.channel_messages(AUDIT_LOG).is_empty());
}

#[tokio::test]
async fn test_status_after_window_notifies_audit_log() {
    let (bot, _, erin, _) = setup();
    bot.store.set(erin.id.clone(), Utc::now() - Duration::days(15));

    bot.say(&erin, "!recruit").await;

    let reply = bot.last_reply().unwrap();
    assert!(reply.starts_with("Your probation window is over."), "{reply}");
    let audit = bot.platform.channel_messages(AUDIT_LOG);
    assert_eq!(audit.len(), 1);
    assert!(audit[0].starts_with("Probation review due for <@105> (Erin)"));
}

#[test]
fn test_router_rejects_unusable_probation_window() {
    let mut config = test_config();
    config.probation.window_days = 200_000_000;

    let err = CommandRouter::new(
        config,
        Arc::new(FakePlatform::new(Vec::new())),
        Arc::new(MemoryStore::new()),
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
}

#[tokio::test]
async fn test_status_without_record() {
    let (bot, _, erin, _) = setup();

    bot.say(&erin, "!recruit").await;

    let reply = bot.last_reply().unwrap();
    assert!(reply.starts_with("Could not find your promotion date."), "{reply}");
}

#[tokio::test]
async fn test_status_for_non_recruit() {
    let (bot, _, _, frank) = setup();

    bot.say(&frank, "!recruit").await;

    assert_eq!(
        bot.last_reply().as_deref(),
        Some("This command is only available to members with the recruit role.")
    );
}

#[tokio::test]
async fn test_status_from_direct_message() {
    let (bot, _, _, _) = setup();
    let message = InboundMessage {
        id: "dm-1".into(),
        channel_id: "dm".into(),
        author_id: "105".into(),
        author_is_bot: false,
        member: None,
        content: "!recruit".to_string(),
    };

    bot.router.handle_message(&message).await;

    assert_eq!(
        bot.last_reply().as_deref(),
        Some("I can't find information about your account.")
    );
}

#[tokio::test]
async fn test_rank_command_from_direct_message() {
    let (bot, _, _, _) = setup();
    let message = InboundMessage {
        id: "dm-2".into(),
        channel_id: "dm".into(),
        author_id: "100".into(),
        author_is_bot: false,
        member: None,
        content: "!Frank promote".to_string(),
    };

    bot.router.handle_message(&message).await;

    assert_eq!(
        bot.last_reply().as_deref(),
        Some("This command is only available inside the server.")
    );
    assert!(bot.platform.mutations().is_empty());
}

#[tokio::test]
async fn test_announcement_is_relayed_verbatim() {
    let (bot, _, _, frank) = setup();

    bot.say(&frank, "*announce   Raid tonight at 20:00  ").await;

    assert_eq!(
        bot.platform.channel_messages(ANNOUNCEMENTS),
        vec!["Raid tonight at 20:00".to_string()]
    );
    assert!(bot.platform.replies().is_empty());
}

#[tokio::test]
async fn test_empty_announcement_asks_for_text() {
    let (bot, alice, _, _) = setup();

    bot.say(&alice, "*announce").await;

    assert_eq!(
        bot.last_reply().as_deref(),
        Some("Please provide the announcement text.")
    );
    assert!(bot.platform.channel_messages(ANNOUNCEMENTS).is_empty());
}

#[tokio::test]
async fn test_failed_announcement_is_swallowed() {
    let (bot, alice, _, _) = setup();
    bot.platform.fail(Op::Channel);

    bot.say(&alice, "*announce Raid tonight").await;

    assert!(bot.platform.calls().is_empty());
}

#[tokio::test]
async fn test_bot_authors_are_ignored() {
    let (bot, _, _, _) = setup();
    let mut other_bot = member("900", "Helper", &[ADMIN]);
    other_bot.bot = true;

    bot.say(&other_bot, "!Frank promote").await;
    bot.say(&other_bot, "*announce hello").await;
    bot.say(&other_bot, "!recruit").await;

    assert!(bot.platform.calls().is_empty());
}

#[tokio::test]
async fn test_unrelated_chatter_is_ignored() {
    let (bot, alice, _, _) = setup();

    bot.say(&alice, "good morning").await;
    bot.say(&alice, "1").await;

    assert!(bot.platform.calls().is_empty());
}

#[tokio::test]
async fn test_newcomer_gets_guest_role() {
    let (bot, _, _, _) = setup();
    let newbie = bot.platform.member("300").unwrap();

    bot.router
        .handle_event(GatewayEvent::MemberJoined { member: newbie })
        .await;

    assert_eq!(
        bot.platform.member("300").unwrap().roles,
        vec![RoleId::from(GUEST)]
    );
    assert_eq!(
        bot.platform.channel_messages(AUDIT_LOG),
        vec!["✅ Guest role granted to newcomer: newbie#0001".to_string()]
    );
}

#[tokio::test]
async fn test_newcomer_without_guest_role_is_audited() {
    let (bot, _, _, _) = setup();
    bot.platform.delete_role(GUEST);
    let newbie = bot.platform.member("300").unwrap();

    bot.router
        .handle_event(GatewayEvent::MemberJoined { member: newbie })
        .await;

    assert!(bot.platform.member("300").unwrap().roles.is_empty());
    let audit = bot.platform.channel_messages(AUDIT_LOG);
    assert_eq!(audit.len(), 1);
    assert!(audit[0].starts_with("❌ Failed to grant the guest role to: newbie#0001\nError: "));
    assert!(audit[0].ends_with("Please tell an administrator."));
}

#[tokio::test]
async fn test_newcomer_role_assignment_failure_is_audited() {
    let (bot, _, _, _) = setup();
    bot.platform.fail(Op::AddRole);
    let newbie = bot.platform.member("300").unwrap();

    bot.router
        .handle_event(GatewayEvent::MemberJoined { member: newbie })
        .await;

    let audit = bot.platform.channel_messages(AUDIT_LOG);
    assert_eq!(audit.len(), 1);
    assert!(audit[0].starts_with("❌ Failed to grant the guest role to: newbie#0001"));
}

#[tokio::test]
async fn test_message_event_from_json() {
    let (bot, _, _, _) = setup();
    let event: GatewayEvent = serde_json::from_value(serde_json::json!({
        "type": "message_created",
        "message": {
            "id": "m-1",
            "channel_id": "ops",
            "author_id": "100",
            "member": {
                "id": "100",
                "display_name": "Alice",
                "roles": [ADMIN]
            },
            "content": "!Frank promote"
        }
    }))
    .unwrap();

    bot.router.handle_event(event).await;

    assert_eq!(
        bot.platform.member("106").unwrap().roles,
        vec![RoleId::from(GUEST), RoleId::from(RECRUIT)]
    );
}

#[tokio::test]
async fn test_ready_event_has_no_side_effects() {
    let (bot, _, _, _) = setup();

    bot.router.handle_event(GatewayEvent::Ready).await;

    assert!(bot.platform.calls().is_empty());
}

#[tokio::test]
async fn test_undeliverable_error_reply_does_not_panic() {
    let (bot, alice, _, _) = setup();
    bot.platform.fail(Op::Reply);

    bot.say(&alice, "!Zed promote").await;

    assert!(bot.platform.calls().is_empty());
}
