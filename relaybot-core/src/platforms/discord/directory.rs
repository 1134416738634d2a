// File: relaybot-core/src/platforms/discord/directory.rs

use std::str::FromStr;
use std::sync::Arc;

use twilight_cache_inmemory::InMemoryCache;
use twilight_model::channel::ChannelType;
use twilight_model::guild::Permissions;
use twilight_model::id::Id;
use twilight_model::id::marker::GuildMarker;

use crate::models::MemberPermissions;
use crate::platforms::{
    ChannelKind, ChannelSummary, GuildDirectory, GuildSummary, MemberSummary, RoleSummary,
};

/// `GuildDirectory` backed by the gateway's in-memory cache.
pub struct CacheGuildDirectory {
    cache: Arc<InMemoryCache>,
}

impl CacheGuildDirectory {
    pub fn new(cache: Arc<InMemoryCache>) -> Self {
        Self { cache }
    }
}

pub(crate) fn channel_kind(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::GuildText => ChannelKind::Text,
        ChannelType::GuildVoice => ChannelKind::Voice,
        ChannelType::GuildCategory => ChannelKind::Category,
        ChannelType::GuildAnnouncement => ChannelKind::Announcement,
        ChannelType::GuildForum => ChannelKind::Forum,
        ChannelType::GuildStageVoice => ChannelKind::Stage,
        ChannelType::AnnouncementThread | ChannelType::PublicThread | ChannelType::PrivateThread => {
            ChannelKind::Thread
        }
        _ => ChannelKind::Other,
    }
}

pub(crate) fn member_permissions(perms: Permissions) -> MemberPermissions {
    MemberPermissions {
        administrator: perms.contains(Permissions::ADMINISTRATOR),
        manage_messages: perms.contains(Permissions::MANAGE_MESSAGES),
    }
}

fn guild_id(raw: &str) -> Option<Id<GuildMarker>> {
    Id::from_str(raw).ok()
}

impl GuildDirectory for CacheGuildDirectory {
    fn guilds(&self) -> Vec<GuildSummary> {
        self.cache
            .iter()
            .guilds()
            .map(|entry| {
                let guild = entry.value();
                GuildSummary {
                    id: guild.id().to_string(),
                    name: guild.name().to_string(),
                    owner_id: Some(guild.owner_id().to_string()),
                    member_count: guild.member_count(),
                }
            })
            .collect()
    }

    fn guild(&self, raw_id: &str) -> Option<GuildSummary> {
        let guild = self.cache.guild(guild_id(raw_id)?)?;
        Some(GuildSummary {
            id: guild.id().to_string(),
            name: guild.name().to_string(),
            owner_id: Some(guild.owner_id().to_string()),
            member_count: guild.member_count(),
        })
    }

    fn channels(&self, raw_id: &str) -> Vec<ChannelSummary> {
        let Some(id) = guild_id(raw_id) else {
            return Vec::new();
        };
        let Some(channel_ids) = self.cache.guild_channels(id) else {
            return Vec::new();
        };
        channel_ids
            .iter()
            .filter_map(|channel_id| {
                let channel = self.cache.channel(*channel_id)?;
                Some(ChannelSummary {
                    id: channel.id.to_string(),
                    guild_id: raw_id.to_string(),
                    name: channel.name.clone().unwrap_or_else(|| channel.id.to_string()),
                    kind: channel_kind(channel.kind),
                })
            })
            .collect()
    }

    fn roles(&self, raw_id: &str) -> Vec<RoleSummary> {
        let Some(id) = guild_id(raw_id) else {
            return Vec::new();
        };
        let Some(role_ids) = self.cache.guild_roles(id) else {
            return Vec::new();
        };
        role_ids
            .iter()
            .filter_map(|role_id| {
                let cached = self.cache.role(*role_id)?;
                let role = cached.resource();
                Some(RoleSummary {
                    id: role.id.to_string(),
                    name: role.name.clone(),
                    permissions: member_permissions(role.permissions),
                    position: role.position,
                })
            })
            .collect()
    }

    fn members(&self, raw_id: &str) -> Vec<MemberSummary> {
        let Some(id) = guild_id(raw_id) else {
            return Vec::new();
        };
        let Some(user_ids) = self.cache.guild_members(id) else {
            return Vec::new();
        };
        user_ids
            .iter()
            .filter_map(|user_id| {
                let member = self.cache.member(id, *user_id)?;
                let user = self.cache.user(*user_id)?;
                let display_name = member
                    .nick()
                    .map(str::to_string)
                    .or_else(|| user.global_name.clone())
                    .unwrap_or_else(|| user.name.clone());
                Some(MemberSummary {
                    id: user.id.to_string(),
                    username: user.name.clone(),
                    display_name,
                    role_ids: member.roles().iter().map(|r| r.to_string()).collect(),
                    bot: user.bot,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_types_collapse_to_thread() {
        assert_eq!(channel_kind(ChannelType::PublicThread), ChannelKind::Thread);
        assert_eq!(channel_kind(ChannelType::GuildText), ChannelKind::Text);
        assert_eq!(channel_kind(ChannelType::Private), ChannelKind::Other);
    }

    #[test]
    fn administrator_and_manage_messages_are_read_from_bits() {
        let perms = member_permissions(Permissions::ADMINISTRATOR | Permissions::SEND_MESSAGES);
        assert!(perms.administrator);
        assert!(!perms.manage_messages);
    }

    #[test]
    fn empty_cache_yields_nothing() {
        let dir = CacheGuildDirectory::new(Arc::new(InMemoryCache::new()));
        assert!(dir.guilds().is_empty());
        assert!(dir.guild("1").is_none());
        assert!(dir.channels("not-a-snowflake").is_empty());
        assert!(dir.members("1").is_empty());
    }
}
