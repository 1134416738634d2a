use std::time::Duration;

use serde_json::{Value, json};

use relaybot_core::http::HttpMethod;
use relaybot_core::models::{
    ApiMethod, AutocompleteChoice, AutocompleteConfig, AutocompleteService, Command, CommandKind,
    CommandOption, OptionType, OptionValue,
};
use relaybot_core::test_utils::{EventBuilder, RecordedCall, ScriptedHttpClient, TestBot, command};

fn lookup_command(config: AutocompleteConfig) -> Command {
    let mut cmd = command("lookup", CommandKind::Slash, "{city}");
    cmd.options.push(CommandOption::new("region", OptionType::String));
    let mut city = CommandOption::new("city", OptionType::String);
    city.autocomplete = Some(config);
    cmd.options.push(city);
    cmd
}

fn external(url: &str) -> AutocompleteConfig {
    AutocompleteConfig {
        enabled: true,
        service: AutocompleteService::External,
        api_url: Some(url.into()),
        ..Default::default()
    }
}

fn answered(bot: &TestBot) -> Vec<Vec<AutocompleteChoice>> {
    bot.client
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            RecordedCall::Autocomplete { choices, .. } => Some(choices),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn results_are_cached_for_thirty_seconds() {
    let bot = TestBot::with_http(ScriptedHttpClient::ok(r#"[{"name":"Berlin","value":"ber"}]"#));
    bot.add(lookup_command(external("https://ac.example/cities"))).await;
    let keystroke = || EventBuilder::autocomplete("lookup", "city", "ber").build();

    bot.dispatcher().dispatch(&keystroke()).await;
    tokio::time::advance(Duration::from_secs(10)).await;
    bot.dispatcher().dispatch(&keystroke()).await;
    assert_eq!(bot.http.call_count(), 1);

    tokio::time::advance(Duration::from_secs(21)).await;
    bot.dispatcher().dispatch(&keystroke()).await;
    assert_eq!(bot.http.call_count(), 2);

    let expected = vec![AutocompleteChoice::new("Berlin", "ber")];
    assert_eq!(answered(&bot), vec![expected.clone(), expected.clone(), expected]);
}

#[tokio::test]
async fn different_input_is_a_different_cache_entry() {
    let bot = TestBot::with_http(ScriptedHttpClient::ok("[]"));
    bot.add(lookup_command(external("https://ac.example/cities"))).await;

    bot.dispatcher()
        .dispatch(&EventBuilder::autocomplete("lookup", "city", "b").build())
        .await;
    bot.dispatcher()
        .dispatch(&EventBuilder::autocomplete("lookup", "city", "be").build())
        .await;

    assert_eq!(bot.http.call_count(), 2);
}

#[tokio::test]
async fn never_more_than_twenty_five_suggestions() {
    let items: Vec<Value> = (0..40)
        .map(|i| json!({ "name": format!("City {i}"), "value": format!("c{i}") }))
        .collect();
    let bot = TestBot::with_http(ScriptedHttpClient::ok(Value::Array(items).to_string()));
    bot.add(lookup_command(external("https://ac.example/cities"))).await;

    bot.dispatcher()
        .dispatch(&EventBuilder::autocomplete("lookup", "city", "").build())
        .await;

    let answers = answered(&bot);
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].len(), 25);
    assert_eq!(answers[0][0], AutocompleteChoice::new("City 0", "c0"));
}

#[tokio::test]
async fn get_requests_carry_the_keystroke_context() {
    let bot = TestBot::with_http(ScriptedHttpClient::ok("[]"));
    let mut config = external("https://ac.example/cities");
    config.use_previous_parameters = true;
    bot.add(lookup_command(config)).await;

    let event = EventBuilder::autocomplete("lookup", "city", "par")
        .option("region", OptionValue::String("eu".into()))
        .build();
    bot.dispatcher().dispatch(&event).await;

    let request = bot.http.requests().remove(0);
    assert_eq!(request.method, HttpMethod::Get);
    let query = |key: &str| {
        request
            .query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    };
    assert_eq!(query("input").as_deref(), Some("par"));
    assert_eq!(query("botId").as_deref(), Some("42"));
    assert_eq!(query("userId").as_deref(), Some("10"));
    assert_eq!(query("guildId").as_deref(), Some("1"));
    assert_eq!(query("currentParameter").as_deref(), Some("city"));
    let previous: Value = serde_json::from_str(&query("previousParameters").unwrap()).unwrap();
    assert_eq!(previous, json!({ "region": "eu" }));
}

#[tokio::test]
async fn post_requests_merge_into_the_configured_body() {
    let bot = TestBot::with_http(ScriptedHttpClient::ok(r#"{"ber":"Berlin"}"#));
    let mut config = external("https://ac.example/cities");
    config.api_method = ApiMethod::Post;
    config.api_body = Some(json!({ "dataset": "world" }));
    config.api_headers.insert("X-Api-Key".into(), "secret".into());
    bot.add(lookup_command(config)).await;

    bot.dispatcher()
        .dispatch(&EventBuilder::autocomplete("lookup", "city", "be").build())
        .await;

    let request = bot.http.requests().remove(0);
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.headers.get("X-Api-Key").map(String::as_str), Some("secret"));
    let body = request.json.expect("json body");
    assert_eq!(body["dataset"], "world");
    assert_eq!(body["input"], "be");
    assert_eq!(answered(&bot), vec![vec![AutocompleteChoice::new("Berlin", "ber")]]);
}

#[tokio::test]
async fn failing_services_produce_an_empty_list() {
    let bot = TestBot::with_http(ScriptedHttpClient::status(500, "boom"));
    bot.add(lookup_command(external("https://ac.example/cities"))).await;

    bot.dispatcher()
        .dispatch(&EventBuilder::autocomplete("lookup", "city", "x").build())
        .await;
    bot.dispatcher()
        .dispatch(&EventBuilder::autocomplete("lookup", "city", "x").build())
        .await;

    assert_eq!(answered(&bot), vec![Vec::new(), Vec::new()]);
    // Failures are not cached.
    assert_eq!(bot.http.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_services_never_produce_suggestions() {
    let http = ScriptedHttpClient::ok(r#"[{"name":"Late","value":"late"}]"#)
        .with_delay(Duration::from_secs(5));
    let bot = TestBot::with_http(http);
    bot.add(lookup_command(external("https://ac.example/cities"))).await;

    bot.dispatcher()
        .dispatch(&EventBuilder::autocomplete("lookup", "city", "la").build())
        .await;

    assert!(answered(&bot).iter().all(|choices| choices.is_empty()));
}

#[tokio::test]
async fn builtin_channel_lookup_uses_the_guild_cache() {
    let bot = TestBot::new();
    let mut cmd = command("move", CommandKind::Slash, "{channel}");
    let mut channel = CommandOption::new("channel", OptionType::String);
    channel.autocomplete = Some(AutocompleteConfig {
        enabled: true,
        service: AutocompleteService::Channels,
        ..Default::default()
    });
    cmd.options.push(channel);
    bot.add(cmd).await;

    bot.dispatcher()
        .dispatch(&EventBuilder::autocomplete("move", "channel", "gen").build())
        .await;

    assert_eq!(
        answered(&bot),
        vec![vec![
            AutocompleteChoice::new("general", "500"),
            AutocompleteChoice::new("general-voice", "501"),
        ]]
    );
    assert_eq!(bot.http.call_count(), 0);
}

#[tokio::test]
async fn options_without_autocomplete_get_an_empty_list() {
    let bot = TestBot::new();
    bot.add(lookup_command(AutocompleteConfig::default())).await;

    bot.dispatcher()
        .dispatch(&EventBuilder::autocomplete("lookup", "city", "x").build())
        .await;
    bot.dispatcher()
        .dispatch(&EventBuilder::autocomplete("nothing", "city", "x").build())
        .await;

    assert_eq!(answered(&bot), vec![Vec::new(), Vec::new()]);
    assert_eq!(bot.http.call_count(), 0);
}
