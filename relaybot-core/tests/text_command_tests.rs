use relaybot_core::models::{
    CommandKind, EMBED_COLOR, LogStatus, RequiredPermission, Server,
};
use relaybot_core::repositories::ServerRepository;
use relaybot_core::services::discord::permissions::PERMISSION_DENIED_MESSAGE;
use relaybot_core::services::discord::{CommandExecutor, TextCommandHandler};
use relaybot_core::test_utils::{CHANNEL_ID, RecordedCall, TestBot, command, message, user};

fn handler(bot: &TestBot) -> TextCommandHandler {
    TextCommandHandler::new(CommandExecutor::new(bot.session.clone()))
}

#[tokio::test]
async fn prefixed_messages_run_text_commands() {
    let bot = TestBot::new();
    bot.add(command("rules", CommandKind::Text, "Be kind, {user}. Welcome to {server}."))
        .await;

    let acted = handler(&bot).handle_message(&message("!rules please")).await.unwrap();

    assert!(acted);
    let calls = bot.client.calls();
    assert_eq!(calls.len(), 1);
    let RecordedCall::ChannelMessage { channel_id, message } = &calls[0] else {
        panic!("expected a channel message, got {:?}", calls[0]);
    };
    assert_eq!(channel_id, CHANNEL_ID);
    assert_eq!(message.content.as_deref(), Some("Be kind, alice. Welcome to Rustaceans."));
    assert_eq!(bot.usage_of("rules").await, 1);
    assert_eq!(bot.logs.all().await[0].status, LogStatus::Success);
}

#[tokio::test]
async fn embed_commands_answer_with_an_embed() {
    let bot = TestBot::new();
    bot.add(command("card", CommandKind::Embed, "Hello {user}")).await;

    handler(&bot).handle_message(&message("!card")).await.unwrap();

    let sent = bot.client.calls().remove(0);
    let message = sent.message().expect("message");
    assert!(message.content.is_none());
    let embed = message.embed.as_ref().expect("embed");
    assert_eq!(embed.description, "Hello alice");
    assert_eq!(embed.color, EMBED_COLOR);
}

#[tokio::test]
async fn other_messages_are_ignored() {
    let bot = TestBot::new();
    bot.add(command("rules", CommandKind::Text, "rules")).await;
    bot.add(command("ping", CommandKind::Slash, "pong")).await;
    let handler = handler(&bot);

    assert!(!handler.handle_message(&message("rules")).await.unwrap());
    assert!(!handler.handle_message(&message("! rules")).await.unwrap());
    assert!(!handler.handle_message(&message("!unknown")).await.unwrap());
    // Slash commands are not reachable through chat.
    assert!(!handler.handle_message(&message("!ping")).await.unwrap());

    let mut from_bot = message("!rules");
    from_bot.author_is_bot = true;
    assert!(!handler.handle_message(&from_bot).await.unwrap());

    assert!(bot.client.calls().is_empty());
}

#[tokio::test]
async fn permissions_come_from_the_member_roles() {
    let bot = TestBot::new();
    let mut purge = command("purge", CommandKind::Text, "purged");
    purge.required_permission = RequiredPermission::Moderator;
    bot.add(purge).await;
    let handler = handler(&bot);

    let mut from_carol = message("!purge");
    from_carol.author = user("12", "carol");
    assert!(handler.handle_message(&from_carol).await.unwrap());
    assert_eq!(bot.client.bodies(), vec![PERMISSION_DENIED_MESSAGE]);
    assert_eq!(bot.logs.all().await[0].status, LogStatus::PermissionDenied);

    bot.client.clear();
    let mut from_bob = message("!purge");
    from_bob.author = user("11", "bob");
    handler.handle_message(&from_bob).await.unwrap();
    assert_eq!(bot.client.bodies(), vec!["purged"]);
    assert_eq!(bot.usage_of("purge").await, 1);
}

#[tokio::test]
async fn invoking_message_can_be_removed() {
    let bot = TestBot::new();
    let mut secret = command("secret", CommandKind::Text, "shh");
    secret.delete_user_message = true;
    bot.add(secret).await;

    let msg = message("!secret");
    handler(&bot).handle_message(&msg).await.unwrap();

    let calls = bot.client.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(
        &calls[1],
        RecordedCall::DeleteMessage { channel_id, message_id }
            if channel_id == CHANNEL_ID && *message_id == msg.message_id
    ));
}

#[tokio::test]
async fn disabled_servers_get_no_text_responses() {
    let bot = TestBot::new();
    bot.add(command("rules", CommandKind::Text, "rules")).await;
    bot.servers.upsert_server(&Server::new("1", false)).await.unwrap();

    let acted = handler(&bot).handle_message(&message("!rules")).await.unwrap();

    assert!(!acted);
    assert!(bot.client.calls().is_empty());
    assert_eq!(bot.usage_of("rules").await, 0);
}
