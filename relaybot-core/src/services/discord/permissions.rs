// File: src/services/discord/permissions.rs

use crate::models::{MemberPermissions, RequiredPermission};

pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have permission to use this command.";

/// Decides whether a member may run a command that requires `required`.
pub fn is_allowed(required: RequiredPermission, member: MemberPermissions, is_owner: bool) -> bool {
    match required {
        RequiredPermission::Everyone => true,
        RequiredPermission::Moderator => member.manage_messages || member.administrator,
        RequiredPermission::Admin => member.administrator,
        RequiredPermission::ServerOwner => is_owner,
    }
}
