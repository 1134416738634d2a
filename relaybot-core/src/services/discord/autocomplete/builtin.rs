// File: src/services/discord/autocomplete/builtin.rs
//
// Lookups over the cached guild state. Each one substring-matches the input
// case-insensitively and narrows by whichever earlier parameters it knows:
//   server_id / guild_id       -> which guild to search
//   channel_type / type        -> channel kind
//   permission_level / permission ("admin" | "moderator") -> roles, members
//   role_id / role             -> members holding that role

use crate::models::{AutocompleteChoice, AutocompleteService, MemberPermissions};
use crate::platforms::{ChannelKind, GuildDirectory};
use crate::services::discord::autocomplete::{MAX_CHOICES, PreviousParameters, SuggestionRequest, clip};

pub fn resolve(directory: &dyn GuildDirectory, req: &SuggestionRequest<'_>) -> Vec<AutocompleteChoice> {
    let needle = req.input.trim().to_lowercase();
    let guild_id = lookup(req.previous, &["server_id", "guild_id"]).or(req.guild_id);

    let mut found: Vec<(String, String)> = match req.config.service {
        AutocompleteService::Servers => directory
            .guilds()
            .into_iter()
            .filter(|g| matches(&g.name, &needle))
            .map(|g| (g.name, g.id))
            .collect(),
        AutocompleteService::Channels => {
            let Some(guild_id) = guild_id else {
                return Vec::new();
            };
            let kind = lookup(req.previous, &["channel_type", "type"]).and_then(ChannelKind::parse);
            directory
                .channels(guild_id)
                .into_iter()
                .filter(|c| kind.is_none_or(|k| c.kind == k))
                .filter(|c| matches(&c.name, &needle))
                .map(|c| (c.name, c.id))
                .collect()
        }
        AutocompleteService::Roles => {
            let Some(guild_id) = guild_id else {
                return Vec::new();
            };
            let level = lookup(req.previous, &["permission_level", "permission"]);
            directory
                .roles(guild_id)
                .into_iter()
                .filter(|r| r.id != guild_id)
                .filter(|r| level.is_none_or(|l| meets_level(r.permissions, l)))
                .filter(|r| matches(&r.name, &needle))
                .map(|r| (r.name, r.id))
                .collect()
        }
        AutocompleteService::Users => {
            let Some(guild_id) = guild_id else {
                return Vec::new();
            };
            let role = lookup(req.previous, &["role_id", "role"]);
            let level = lookup(req.previous, &["permission_level", "permission"]);
            directory
                .members(guild_id)
                .into_iter()
                .filter(|m| role.is_none_or(|r| m.role_ids.iter().any(|id| id == r)))
                .filter(|m| {
                    level.is_none_or(|l| meets_level(directory.member_permissions(guild_id, &m.id), l))
                })
                .filter(|m| matches(&m.display_name, &needle) || matches(&m.username, &needle))
                .map(|m| {
                    let label = if m.display_name == m.username {
                        m.username
                    } else {
                        format!("{} ({})", m.display_name, m.username)
                    };
                    (label, m.id)
                })
                .collect()
        }
        AutocompleteService::External => Vec::new(),
    };

    found.sort_by_key(|(name, _)| name.to_lowercase());
    found
        .into_iter()
        .take(MAX_CHOICES)
        .map(|(name, value)| AutocompleteChoice::new(clip(&name), clip(&value)))
        .collect()
}

fn matches(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(needle)
}

fn lookup<'a>(previous: &'a PreviousParameters, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| previous.get(*k))
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

fn meets_level(perms: MemberPermissions, level: &str) -> bool {
    match level.trim().to_lowercase().as_str() {
        "admin" | "administrator" => perms.administrator,
        "moderator" | "mod" => perms.administrator || perms.manage_messages,
        _ => true,
    }
}
