use std::time::Duration;

use relaybot_core::models::{
    CommandKind, CommandOption, LogStatus, OptionType, OptionValue, RequiredPermission, Server,
};
use relaybot_core::repositories::ServerRepository;
use relaybot_core::services::discord::executor::{EMPTY_RESPONSE, GENERIC_FAILURE_MESSAGE};
use relaybot_core::services::discord::handlers::COMMAND_UNAVAILABLE_MESSAGE;
use relaybot_core::services::discord::permissions::PERMISSION_DENIED_MESSAGE;
use relaybot_core::test_utils::{EventBuilder, RecordedCall, ScriptedHttpClient, TestBot, command};

#[tokio::test]
async fn ping_reports_gateway_latency() {
    let bot = TestBot::new();
    bot.add(command("ping", CommandKind::Slash, "Pong! {ping}ms")).await;
    bot.session.record_latency(Duration::from_millis(42));

    bot.dispatcher().dispatch(&EventBuilder::slash("ping").build()).await;

    let calls = bot.client.calls();
    assert!(matches!(calls[0], RecordedCall::Defer { ephemeral: true, .. }));
    assert!(matches!(calls[1], RecordedCall::EditOriginal { .. }));
    assert_eq!(bot.client.bodies(), vec!["Pong! 42ms"]);
    assert_eq!(bot.usage_of("ping").await, 1);

    let logs = bot.logs.all().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, LogStatus::Success);
    assert_eq!(logs[0].status.as_str(), "Sucesso");
    assert_eq!(logs[0].command_name, "ping");
    assert_eq!(logs[0].server_id.as_deref(), Some("1"));
    assert!(logs[0].callback.is_none());
}

#[tokio::test]
async fn options_are_substituted_and_logged() {
    let bot = TestBot::new();
    let mut say = command("say", CommandKind::Slash, "{user} says {text}");
    say.options.push(CommandOption::new("text", OptionType::String));
    bot.add(say).await;

    let event = EventBuilder::slash("say")
        .option("text", OptionValue::String("hello".into()))
        .build();
    bot.dispatcher().dispatch(&event).await;

    assert_eq!(bot.client.bodies(), vec!["alice says hello"]);
    let logs = bot.logs.all().await;
    assert_eq!(logs[0].parameters.get("text").and_then(|v| v.as_str()), Some("hello"));
}

#[tokio::test]
async fn empty_render_still_answers() {
    let bot = TestBot::new();
    bot.add(command("blank", CommandKind::Slash, "")).await;

    bot.dispatcher().dispatch(&EventBuilder::slash("blank").build()).await;

    assert_eq!(bot.client.bodies(), vec![EMPTY_RESPONSE]);
}

#[tokio::test]
async fn unknown_and_inactive_commands_get_an_ephemeral_notice() {
    let bot = TestBot::new();
    let mut off = command("off", CommandKind::Slash, "nope");
    off.is_active = false;
    bot.add(off).await;

    bot.dispatcher().dispatch(&EventBuilder::slash("missing").build()).await;
    bot.dispatcher().dispatch(&EventBuilder::slash("off").build()).await;

    let calls = bot.client.calls();
    assert_eq!(calls.len(), 2);
    for call in calls {
        let RecordedCall::Reply { message, .. } = call else {
            panic!("expected a reply, got {call:?}");
        };
        assert!(message.ephemeral);
        assert_eq!(message.body(), Some(COMMAND_UNAVAILABLE_MESSAGE));
    }
    assert!(bot.logs.all().await.is_empty());
}

#[tokio::test]
async fn denied_invocations_are_logged_and_not_counted() {
    let bot = TestBot::new();
    let mut purge = command("purge", CommandKind::Slash, "purged");
    purge.required_permission = RequiredPermission::Moderator;
    bot.add(purge).await;

    bot.dispatcher().dispatch(&EventBuilder::slash("purge").build()).await;

    let calls = bot.client.calls();
    assert_eq!(calls.len(), 1);
    let RecordedCall::Reply { message, .. } = &calls[0] else {
        panic!("expected denial reply");
    };
    assert!(message.ephemeral);
    assert_eq!(message.body(), Some(PERMISSION_DENIED_MESSAGE));
    assert_eq!(bot.usage_of("purge").await, 0);

    let logs = bot.logs.all().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, LogStatus::PermissionDenied);

    bot.client.clear();
    bot.dispatcher()
        .dispatch(&EventBuilder::slash("purge").moderator().build())
        .await;
    assert_eq!(bot.client.bodies(), vec!["purged"]);
    assert_eq!(bot.usage_of("purge").await, 1);
}

#[tokio::test]
async fn guild_owner_passes_owner_only_commands() {
    let bot = TestBot::new();
    let mut nuke = command("nuke", CommandKind::Slash, "done");
    nuke.required_permission = RequiredPermission::ServerOwner;
    bot.add(nuke).await;

    bot.dispatcher()
        .dispatch(&EventBuilder::slash("nuke").admin().build())
        .await;
    assert_eq!(bot.client.bodies(), vec![PERMISSION_DENIED_MESSAGE]);

    bot.client.clear();
    bot.dispatcher()
        .dispatch(&EventBuilder::slash("nuke").by("99", "owner").build())
        .await;
    assert_eq!(bot.client.bodies(), vec!["done"]);
}

#[tokio::test]
async fn disabled_servers_are_ignored_entirely() {
    let bot = TestBot::new();
    bot.add(command("ping", CommandKind::Slash, "pong")).await;
    bot.servers.upsert_server(&Server::new("1", false)).await.unwrap();

    bot.dispatcher().dispatch(&EventBuilder::slash("ping").build()).await;

    assert!(bot.client.calls().is_empty());
    assert!(bot.logs.all().await.is_empty());
    assert_eq!(bot.usage_of("ping").await, 0);

    // Direct messages have no server record to consult.
    bot.dispatcher()
        .dispatch(&EventBuilder::slash("ping").in_dm().build())
        .await;
    assert_eq!(bot.client.bodies(), vec!["pong"]);
}

#[tokio::test]
async fn usage_logging_can_be_switched_off() {
    let bot = TestBot::new();
    let mut quiet = command("quiet", CommandKind::Slash, "shh");
    quiet.log_usage = false;
    bot.add(quiet).await;

    bot.dispatcher().dispatch(&EventBuilder::slash("quiet").build()).await;

    assert_eq!(bot.usage_of("quiet").await, 1);
    assert!(bot.logs.all().await.is_empty());
}

#[tokio::test]
async fn public_responses_are_not_ephemeral() {
    let bot = TestBot::new();
    let mut announce = command("announce", CommandKind::Slash, "hear ye");
    announce.delete_user_message = true;
    bot.add(announce).await;

    bot.dispatcher().dispatch(&EventBuilder::slash("announce").build()).await;

    let calls = bot.client.calls();
    assert!(matches!(calls[0], RecordedCall::Defer { ephemeral: false, .. }));
    assert_eq!(calls[1].message().map(|m| m.ephemeral), Some(false));
}

#[tokio::test]
async fn expired_interactions_are_dropped_quietly() {
    let bot = TestBot::new();
    bot.add(command("ping", CommandKind::Slash, "pong")).await;
    bot.client.expire_interactions(true);

    bot.dispatcher().dispatch(&EventBuilder::slash("ping").build()).await;

    assert!(bot.client.calls().is_empty());
    assert!(bot.logs.all().await.is_empty());
    assert_eq!(bot.usage_of("ping").await, 0);
}

#[tokio::test]
async fn execution_errors_are_reported_and_always_logged() {
    let bot = TestBot::new();
    let mut quiet = command("quiet", CommandKind::Slash, "done");
    quiet.log_usage = false;
    bot.add(quiet).await;
    bot.client.fail_next_edits(1);

    bot.dispatcher().dispatch(&EventBuilder::slash("quiet").build()).await;

    let bodies = bot.client.bodies();
    assert_eq!(bodies.last().map(String::as_str), Some(GENERIC_FAILURE_MESSAGE));
    assert!(!bodies.iter().any(|b| b == "done"));
    assert_eq!(bot.usage_of("quiet").await, 0);

    let logs = bot.logs.all().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, LogStatus::Error);
    assert_eq!(logs[0].status.as_str(), "Erro");
    let reason = logs[0].error_message.as_deref().expect("error message");
    assert!(reason.contains("500"));
}

#[tokio::test]
async fn webhook_payload_carries_interaction_and_parameters() {
    let bot = TestBot::with_http(ScriptedHttpClient::ok("{}"));
    let mut hook = command("report", CommandKind::Slash, "Reported");
    hook.options.push(CommandOption::new("reason", OptionType::String));
    hook.webhook_url = Some("https://hooks.example/report".into());
    bot.add(hook).await;

    let event = EventBuilder::slash("report")
        .option("reason", OptionValue::String("spam".into()))
        .build();
    bot.dispatcher().dispatch(&event).await;

    let requests = bot.http.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://hooks.example/report");
    let body = requests[0].json.as_ref().expect("json body");
    assert_eq!(body["command"], "report");
    assert_eq!(body["botId"], "42");
    assert_eq!(body["parameters"]["reason"], "spam");
    assert_eq!(body["interaction"]["token"], event.interaction.token.as_str());
    assert!(body.get("target").is_none());

    let logs = bot.logs.all().await;
    let callback = logs[0].callback.as_ref().expect("callback outcome");
    assert_eq!(callback.status, LogStatus::Success);
    assert_eq!(callback.http_status, Some(200));
}

#[tokio::test]
async fn failed_webhook_shows_the_configured_notice() {
    let bot = TestBot::with_http(ScriptedHttpClient::status(502, "bad gateway"));
    let mut hook = command("report", CommandKind::Slash, "Reported");
    hook.webhook_url = Some("https://hooks.example/report".into());
    hook.webhook_failure_message = Some("The report service is down.".into());
    bot.add(hook).await;

    bot.dispatcher().dispatch(&EventBuilder::slash("report").build()).await;

    assert_eq!(
        bot.client.bodies(),
        vec!["Reported", "The report service is down."]
    );
    let notice = bot.client.calls().pop().expect("notice");
    assert!(matches!(notice, RecordedCall::FollowUp { ref message, .. } if message.ephemeral));

    // The command itself still succeeded.
    assert_eq!(bot.usage_of("report").await, 1);
    let logs = bot.logs.all().await;
    assert_eq!(logs[0].status, LogStatus::Success);
    let callback = logs[0].callback.as_ref().expect("callback outcome");
    assert_eq!(callback.status, LogStatus::Error);
    assert_eq!(callback.http_status, Some(502));
}
