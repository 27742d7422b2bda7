/// Permission checks: the platform's role model seen as a boolean capability.
use std::collections::HashMap;

use async_trait::async_trait;

use cmdbot_core::UserId;

use crate::context::CommandContext;
use crate::descriptor::PermissionSet;

/// Answers whether the invoker holds every permission in `required`.
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn has_permissions(&self, ctx: &CommandContext, required: &PermissionSet) -> bool;
}

/// Grants everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl PermissionChecker for AllowAll {
    async fn has_permissions(&self, _ctx: &CommandContext, _required: &PermissionSet) -> bool {
        true
    }
}

/// Fixed per-user grants.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    grants: HashMap<UserId, PermissionSet>,
}

impl StaticPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, user: UserId, permission: impl Into<String>) -> Self {
        self.grants.entry(user).or_default().insert(permission.into());
        self
    }

    pub fn granted(&self, user: UserId) -> Option<&PermissionSet> {
        self.grants.get(&user)
    }
}

#[async_trait]
impl PermissionChecker for StaticPermissions {
    async fn has_permissions(&self, ctx: &CommandContext, required: &PermissionSet) -> bool {
        match self.grants.get(&ctx.author_id) {
            Some(held) => required.is_subset(held),
            None => required.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cmdbot_core::{Author, MessageEvent, RecordingClient};

    use crate::registry::CommandRegistry;

    fn ctx(author: u64) -> CommandContext {
        CommandContext::new(
            Arc::new(MessageEvent::in_guild(1, 2, 3, Author::new(author, "ann"), "!ban")),
            Arc::new(RecordingClient::new()),
            Arc::new(CommandRegistry::default()),
        )
    }

    fn set(perms: &[&str]) -> PermissionSet {
        perms.iter().map(|p| p.to_string()).collect()
    }

    #[tokio::test]
    async fn test_static_grants() {
        let checker = StaticPermissions::new()
            .grant(UserId(10), "BAN_MEMBERS")
            .grant(UserId(10), "KICK_MEMBERS");

        assert!(checker.has_permissions(&ctx(10), &set(&["BAN_MEMBERS"])).await);
        assert!(checker.has_permissions(&ctx(10), &set(&["BAN_MEMBERS", "KICK_MEMBERS"])).await);
        assert!(!checker.has_permissions(&ctx(10), &set(&["ADMINISTRATOR"])).await);
        assert!(!checker.has_permissions(&ctx(11), &set(&["BAN_MEMBERS"])).await);
        assert!(checker.has_permissions(&ctx(11), &set(&[])).await);
    }

    #[tokio::test]
    async fn test_allow_all() {
        assert!(AllowAll.has_permissions(&ctx(1), &set(&["ADMINISTRATOR"])).await);
    }
}
