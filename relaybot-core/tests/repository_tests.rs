// Runs against the database at TEST_DATABASE_URL:
//   cargo test -p relaybot-core --test repository_tests -- --ignored

use serde_json::{Map, Value};
use uuid::Uuid;

use relaybot_core::Error;
use relaybot_core::models::{
    AutocompleteConfig, CallbackOutcome, Command, CommandKind, CommandLog, CommandOption,
    LogStatus, OptionType, RequiredPermission, Server,
};
use relaybot_core::repositories::{
    CommandLogRepository, CommandRepository, PostgresCommandLogRepository,
    PostgresCommandRepository, PostgresServerRepository, ServerRepository,
};
use relaybot_core::test_utils::helpers::setup_test_database;

#[tokio::test]
#[ignore]
async fn commands_round_trip_through_postgres() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let repo = PostgresCommandRepository::new(db.pool().clone());

    let mut cmd = Command::new("bot-1", "lookup", CommandKind::Slash);
    cmd.description = Some("Find a city".into());
    cmd.response = "{city}".into();
    cmd.required_permission = RequiredPermission::Moderator;
    let mut city = CommandOption::new("city", OptionType::String);
    city.required = true;
    city.autocomplete = Some(AutocompleteConfig {
        enabled: true,
        api_url: Some("https://ac.example/cities".into()),
        ..Default::default()
    });
    cmd.options.push(city);
    repo.create_command(&cmd).await?;

    let loaded = repo
        .get_command_by_name("bot-1", "LOOKUP")
        .await?
        .expect("command stored");
    assert_eq!(loaded.command_id, cmd.command_id);
    assert_eq!(loaded.required_permission, RequiredPermission::Moderator);
    assert_eq!(loaded.options, cmd.options);
    assert!(repo.get_command_by_name("bot-2", "lookup").await?.is_none());

    let dup = Command::new("bot-1", "Lookup", CommandKind::Text);
    assert!(repo.create_command(&dup).await.is_err());

    repo.increment_usage("bot-1", "lookup").await?;
    repo.increment_usage("bot-1", "lookup").await?;
    let mut edited = repo.get_command_by_id(cmd.command_id).await?.expect("by id");
    assert_eq!(edited.usage_count, 2);

    edited.response = "{city}!".into();
    edited.usage_count = 0;
    repo.update_command(&edited).await?;
    let reloaded = repo.get_command_by_id(cmd.command_id).await?.expect("by id");
    assert_eq!(reloaded.response, "{city}!");
    assert_eq!(reloaded.usage_count, 2);

    repo.delete_command(cmd.command_id).await?;
    assert!(repo.list_commands("bot-1").await?.is_empty());
    Ok(())
}

#[tokio::test]
#[ignore]
async fn servers_upsert_by_id() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let repo = PostgresServerRepository::new(db.pool().clone());

    repo.upsert_server(&Server::new("1", true)).await?;
    let mut server = Server::new("1", false);
    server.name = Some("Rustaceans".into());
    server.member_count = Some(3);
    repo.upsert_server(&server).await?;

    let stored = repo.get_server_by_server_id("1").await?.expect("server");
    assert!(!stored.enabled);
    assert_eq!(stored.name.as_deref(), Some("Rustaceans"));
    assert_eq!(repo.list_servers().await?.len(), 1);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn command_logs_keep_status_and_callback() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let repo = PostgresCommandLogRepository::new(db.pool().clone());

    let mut parameters = Map::new();
    parameters.insert("reason".into(), Value::String("spam".into()));
    let entry = CommandLog {
        log_id: Uuid::new_v4(),
        bot_id: "bot-1".into(),
        server_id: Some("1".into()),
        server_name: Some("Rustaceans".into()),
        channel_id: Some("500".into()),
        channel_name: Some("general".into()),
        user_id: "10".into(),
        user_name: "alice".into(),
        command_name: "report".into(),
        status: LogStatus::Success,
        timestamp: chrono::Utc::now(),
        parameters,
        error_message: None,
        callback: Some(CallbackOutcome::failure(Some(502), "bad gateway")),
    };
    repo.create_command_log(&entry).await?;

    let logs = repo.list_logs_for_bot("bot-1", 10).await?;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, LogStatus::Success);
    assert_eq!(logs[0].parameters["reason"], "spam");
    let callback = logs[0].callback.as_ref().expect("callback");
    assert_eq!(callback.status, LogStatus::Error);
    assert_eq!(callback.http_status, Some(502));
    assert!(repo.list_logs_for_bot("bot-2", 10).await?.is_empty());
    Ok(())
}
