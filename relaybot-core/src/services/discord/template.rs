// File: src/services/discord/template.rs
//
// Placeholder substitution for command responses and confirmation prompts.
//
// Rendering runs in ordered passes:
//   1. bound parameters `{key}` and attachment sub-fields `{key.name}` etc.
//   2. (confirmation only) `{param:key}`, `{param:key.field}` and `{params}`
//   3. every `{...}` left that is not a standard placeholder is deleted
//   4. the standard placeholders `{user}`, `{server}`, extras such as
//      `{target}`, and (response only) `{ping}`
// Braces inside parameter values are subject to passes 3 and 4; live values
// substituted in pass 4 are never re-scanned.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::models::{CommandOption, OptionValue, ResolvedOption, placeholder_key};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("static regex"));

const PARAM_NAMESPACE: &str = "param:";
const UNKNOWN_PING: &str = "n/a";

/// A value bound to a placeholder key.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateParam {
    pub key: String,
    pub value: OptionValue,
}

impl TemplateParam {
    pub fn new(key: &str, value: OptionValue) -> Self {
        Self {
            key: placeholder_key(key),
            value,
        }
    }
}

/// Binds resolved options to their declared options, in declaration order.
/// Options the user left empty are not bound.
pub fn bind_options(declared: &[CommandOption], resolved: &[ResolvedOption]) -> Vec<TemplateParam> {
    declared
        .iter()
        .filter_map(|opt| {
            let key = opt.placeholder_key();
            resolved
                .iter()
                .find(|r| placeholder_key(&r.name) == key)
                .map(|r| TemplateParam {
                    key,
                    value: r.value.clone(),
                })
        })
        .collect()
}

/// Parameters as recorded in audit logs and webhook payloads.
pub fn params_to_json(params: &[TemplateParam]) -> Map<String, Value> {
    params
        .iter()
        .map(|p| (p.key.clone(), p.value.to_json()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateMode {
    Response { ping: Option<u64> },
    Confirmation,
}

pub struct TemplateContext<'a> {
    pub mode: TemplateMode,
    pub params: &'a [TemplateParam],
    pub user: &'a str,
    pub server: &'a str,
    /// Additional standard placeholders, e.g. `("target", name)`.
    pub extras: &'a [(&'a str, String)],
}

pub fn render(template: &str, ctx: &TemplateContext<'_>) -> String {
    let bound = PLACEHOLDER_RE.replace_all(template, |caps: &Captures<'_>| {
        resolve_bound(&caps[1], ctx).unwrap_or_else(|| caps[0].to_string())
    });
    let pruned = PLACEHOLDER_RE.replace_all(&bound, |caps: &Captures<'_>| {
        if resolve_standard(&caps[1], ctx).is_some() {
            caps[0].to_string()
        } else {
            String::new()
        }
    });
    PLACEHOLDER_RE
        .replace_all(&pruned, |caps: &Captures<'_>| {
            resolve_standard(&caps[1], ctx).unwrap_or_default()
        })
        .into_owned()
}

fn resolve_bound(token: &str, ctx: &TemplateContext<'_>) -> Option<String> {
    if let Some(value) = resolve_param(token, ctx.params) {
        return Some(value);
    }
    if ctx.mode == TemplateMode::Confirmation {
        if token == "params" {
            return Some(params_listing(ctx.params));
        }
        if let Some(rest) = token.strip_prefix(PARAM_NAMESPACE) {
            return resolve_param(rest, ctx.params);
        }
    }
    None
}

fn resolve_standard(token: &str, ctx: &TemplateContext<'_>) -> Option<String> {
    match token {
        "user" => Some(ctx.user.to_string()),
        "server" => Some(ctx.server.to_string()),
        "ping" => match ctx.mode {
            TemplateMode::Response { ping } => Some(
                ping.map(|ms| ms.to_string())
                    .unwrap_or_else(|| UNKNOWN_PING.to_string()),
            ),
            TemplateMode::Confirmation => None,
        },
        other => ctx
            .extras
            .iter()
            .find(|(name, _)| *name == other)
            .map(|(_, value)| value.clone()),
    }
}

/// Parameter keys are stored normalized, so `{Subject}` and `{subject}`
/// name the same binding.
fn resolve_param(token: &str, params: &[TemplateParam]) -> Option<String> {
    let token = placeholder_key(token);
    let token = token.as_str();
    if let Some(p) = params.iter().find(|p| p.key == token) {
        return Some(p.value.display());
    }

    let (key, field) = token.rsplit_once('.')?;
    let p = params.iter().find(|p| p.key == key)?;
    let OptionValue::Attachment(att) = &p.value else {
        return None;
    };
    match field {
        "name" => Some(att.filename.clone()),
        "extension" => Some(att.extension()),
        "url" => Some(att.url.clone()),
        "size" => Some(att.size_kb().to_string()),
        _ => None,
    }
}

fn params_listing(params: &[TemplateParam]) -> String {
    params
        .iter()
        .map(|p| format!("{}: {}", p.key, p.value.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttachmentValue;

    fn ctx<'a>(mode: TemplateMode, params: &'a [TemplateParam]) -> TemplateContext<'a> {
        TemplateContext {
            mode,
            params,
            user: "alice",
            server: "Rustaceans",
            extras: &[],
        }
    }

    fn attachment() -> TemplateParam {
        TemplateParam::new(
            "File",
            OptionValue::Attachment(AttachmentValue {
                filename: "notes.txt".into(),
                url: "https://cdn.example/notes.txt".into(),
                size: 2600,
            }),
        )
    }

    #[test]
    fn plain_text_is_untouched() {
        let s = "no placeholders here, just text: 100% (ok)";
        assert_eq!(render(s, &ctx(TemplateMode::Response { ping: None }, &[])), s);
    }

    #[test]
    fn response_substitutes_params_and_standard_placeholders() {
        let params = [TemplateParam::new("Amount", OptionValue::Integer(3))];
        let out = render(
            "{user} gave {amount} coins on {server} ({ping}ms)",
            &ctx(TemplateMode::Response { ping: Some(42) }, &params),
        );
        assert_eq!(out, "alice gave 3 coins on Rustaceans (42ms)");
    }

    #[test]
    fn unknown_placeholders_are_removed() {
        let out = render(
            "a{unknown}b{}c{param:amount}",
            &ctx(TemplateMode::Response { ping: Some(1) }, &[]),
        );
        assert_eq!(out, "abc");
    }

    #[test]
    fn ping_is_not_available_in_confirmation() {
        let out = render("Sure? {ping}", &ctx(TemplateMode::Confirmation, &[]));
        assert_eq!(out, "Sure? ");
    }

    #[test]
    fn attachments_expose_sub_fields() {
        let params = [attachment()];
        let out = render(
            "{file} | {file.name} | {file.extension} | {file.url} | {file.size}KB",
            &ctx(TemplateMode::Response { ping: None }, &params),
        );
        assert_eq!(
            out,
            "notes.txt (TXT) | notes.txt | TXT | https://cdn.example/notes.txt | 3KB"
        );
    }

    #[test]
    fn confirmation_supports_param_namespace_and_listing() {
        let params = [
            TemplateParam::new("target", OptionValue::String("bob".into())),
            attachment(),
        ];
        let out = render(
            "Ban {param:target}? ({param:file.extension})\n{params}",
            &ctx(TemplateMode::Confirmation, &params),
        );
        assert_eq!(out, "Ban bob? (TXT)\ntarget: bob\nfile: notes.txt (TXT)");
    }

    #[test]
    fn param_namespace_is_stripped_in_responses() {
        let params = [TemplateParam::new("target", OptionValue::String("bob".into()))];
        let out = render(
            "{param:target}|{params}|{target}",
            &ctx(TemplateMode::Response { ping: None }, &params),
        );
        assert_eq!(out, "||bob");
    }

    #[test]
    fn parameter_placeholders_ignore_case() {
        let params = [TemplateParam::new("Subject", OptionValue::String("bug".into()))];
        let out = render(
            "{Subject}/{subject}",
            &ctx(TemplateMode::Response { ping: None }, &params),
        );
        assert_eq!(out, "bug/bug");
    }

    #[test]
    fn braces_in_parameter_values_never_leak() {
        let params = [TemplateParam::new("text", OptionValue::String("{foo}".into()))];
        let out = render("echo {text}", &ctx(TemplateMode::Response { ping: None }, &params));
        assert_eq!(out, "echo ");
    }

    #[test]
    fn live_values_are_not_rescanned() {
        let c = TemplateContext {
            mode: TemplateMode::Response { ping: None },
            params: &[],
            user: "{server}",
            server: "Rustaceans",
            extras: &[],
        };
        assert_eq!(render("hi {user}", &c), "hi {server}");
    }

    #[test]
    fn extras_resolve_like_standard_placeholders() {
        let extras = [("target", "carol".to_string())];
        let c = TemplateContext {
            mode: TemplateMode::Response { ping: None },
            params: &[],
            user: "alice",
            server: "S",
            extras: &extras,
        };
        assert_eq!(render("{user} -> {target}", &c), "alice -> carol");
    }
}
