// File: src/services/discord/autocomplete/external.rs

use std::time::Duration;

use serde_json::{Map, Value};

use crate::Error;
use crate::http::{HttpClient, HttpRequest};
use crate::models::{ApiMethod, AutocompleteChoice};
use crate::services::discord::autocomplete::{MAX_CHOICES, SuggestionRequest, clip};

/// Queries an operator-configured suggestion service.
///
/// GET sends the context as query parameters (`previousParameters` as a JSON
/// string); POST merges it into the configured JSON body.
pub async fn fetch(
    http: &dyn HttpClient,
    url: &str,
    bot_id: &str,
    req: &SuggestionRequest<'_>,
    timeout: Duration,
) -> Result<Vec<AutocompleteChoice>, Error> {
    let previous: Map<String, Value> = req
        .previous
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    let mut request = match req.config.api_method {
        ApiMethod::Get => {
            let mut request = HttpRequest::get(url, timeout);
            request.query = vec![
                ("input".into(), req.input.to_string()),
                ("botId".into(), bot_id.to_string()),
                ("userId".into(), req.user_id.to_string()),
                ("currentParameter".into(), req.option.to_string()),
                ("previousParameters".into(), Value::Object(previous).to_string()),
            ];
            if let Some(guild_id) = req.guild_id {
                request.query.push(("guildId".into(), guild_id.to_string()));
            }
            request
        }
        ApiMethod::Post => {
            let mut body = match &req.config.api_body {
                Some(Value::Object(base)) => base.clone(),
                _ => Map::new(),
            };
            body.insert("input".into(), Value::String(req.input.to_string()));
            body.insert("botId".into(), Value::String(bot_id.to_string()));
            body.insert("userId".into(), Value::String(req.user_id.to_string()));
            body.insert("currentParameter".into(), Value::String(req.option.to_string()));
            body.insert("previousParameters".into(), Value::Object(previous));
            if let Some(guild_id) = req.guild_id {
                body.insert("guildId".into(), Value::String(guild_id.to_string()));
            }
            HttpRequest::post_json(url, Value::Object(body), timeout)
        }
    };
    request.headers = req.config.api_headers.clone();

    let response = tokio::time::timeout(timeout, http.send(request)).await??;
    if !response.is_success() {
        return Err(Error::Platform(format!(
            "autocomplete service {url} returned HTTP {}",
            response.status
        )));
    }

    let body: Value = serde_json::from_str(&response.body)?;
    Ok(normalize_choices(&body))
}

/// Accepts `[{ "name", "value" }, ...]` or a flat `{ value: name }` object.
pub fn normalize_choices(body: &Value) -> Vec<AutocompleteChoice> {
    let choices: Vec<AutocompleteChoice> = match body {
        Value::Array(items) => items.iter().filter_map(choice_from_item).collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, value)| {
                let name = scalar_to_string(value)?;
                Some(AutocompleteChoice::new(clip(&name), clip(key)))
            })
            .collect(),
        _ => Vec::new(),
    };
    choices.into_iter().take(MAX_CHOICES).collect()
}

fn choice_from_item(item: &Value) -> Option<AutocompleteChoice> {
    match item {
        Value::Object(obj) => {
            let value = obj.get("value").and_then(scalar_to_string)?;
            let name = obj
                .get("name")
                .and_then(scalar_to_string)
                .unwrap_or_else(|| value.clone());
            Some(AutocompleteChoice::new(clip(&name), clip(&value)))
        }
        Value::String(s) => Some(AutocompleteChoice::new(clip(s), clip(s))),
        _ => None,
    }
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::http::{HttpMethod, HttpResponse, MockHttpClient};
    use crate::models::AutocompleteConfig;
    use crate::services::discord::autocomplete::PreviousParameters;

    #[test]
    fn array_and_flat_object_shapes_normalize() {
        let arr = json!([{ "name": "Red", "value": "r" }, { "value": 7 }, 3, "plain"]);
        let choices = normalize_choices(&arr);
        assert_eq!(
            choices,
            vec![
                AutocompleteChoice::new("Red", "r"),
                AutocompleteChoice::new("7", "7"),
                AutocompleteChoice::new("plain", "plain"),
            ]
        );

        let flat = json!({ "sku-1": "Blue shirt" });
        assert_eq!(normalize_choices(&flat), vec![AutocompleteChoice::new("Blue shirt", "sku-1")]);
    }

    #[test]
    fn results_are_capped_and_clipped() {
        let items: Vec<Value> = (0..40)
            .map(|i| json!({ "name": "x".repeat(150), "value": i.to_string() }))
            .collect();
        let choices = normalize_choices(&Value::Array(items));
        assert_eq!(choices.len(), MAX_CHOICES);
        assert_eq!(choices[0].name.chars().count(), 100);
    }

    #[tokio::test]
    async fn get_sends_context_as_query() {
        let config = AutocompleteConfig {
            enabled: true,
            api_url: Some("https://api.example/suggest".into()),
            api_headers: [("X-Key".to_string(), "secret".to_string())].into(),
            ..Default::default()
        };
        let mut previous = PreviousParameters::new();
        previous.insert("role_id".into(), "22".into());
        let req = SuggestionRequest {
            command: "shop",
            option: "item",
            config: &config,
            input: "sh",
            user_id: "10",
            guild_id: Some("1"),
            previous: &previous,
        };

        let mut mock = MockHttpClient::new();
        mock.expect_send()
            .withf(|r| {
                r.method == HttpMethod::Get
                    && r.headers.get("X-Key").map(String::as_str) == Some("secret")
                    && r.query.contains(&("input".to_string(), "sh".to_string()))
                    && r.query.contains(&("currentParameter".to_string(), "item".to_string()))
                    && r.query.contains(&("previousParameters".to_string(), r#"{"role_id":"22"}"#.to_string()))
            })
            .times(1)
            .returning(|_| Ok(HttpResponse { status: 200, body: r#"[{"name":"Shirt","value":"s1"}]"#.into() }));

        let choices = fetch(&mock, "https://api.example/suggest", "bot", &req, Duration::from_millis(1500))
            .await
            .unwrap();
        assert_eq!(choices, vec![AutocompleteChoice::new("Shirt", "s1")]);
    }

    #[tokio::test]
    async fn post_merges_configured_body_and_rejects_errors() {
        let config = AutocompleteConfig {
            enabled: true,
            api_method: ApiMethod::Post,
            api_body: Some(json!({ "catalog": "summer" })),
            ..Default::default()
        };
        let previous = PreviousParameters::new();
        let req = SuggestionRequest {
            command: "shop",
            option: "item",
            config: &config,
            input: "",
            user_id: "10",
            guild_id: None,
            previous: &previous,
        };

        let mut mock = MockHttpClient::new();
        mock.expect_send()
            .withf(|r| {
                let body = r.json.as_ref().unwrap();
                r.method == HttpMethod::Post && body["catalog"] == "summer" && body["botId"] == "bot"
            })
            .returning(|_| Ok(HttpResponse { status: 500, body: String::new() }));

        let result = fetch(&mock, "https://api.example", "bot", &req, Duration::from_millis(1500)).await;
        assert!(matches!(result, Err(Error::Platform(_))));
    }
}
