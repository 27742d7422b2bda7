/// Prefix providers: decide which prefix marks a message as a command.
use std::collections::HashMap;

use cmdbot_core::{ChannelId, GuildId, UserId};

/// Supplies the expected command prefix per invocation context.
///
/// `None` disables prefixing for that context: every message there is
/// treated as a potential unprefixed command.
pub trait PrefixProvider: Send + Sync {
    fn guild_prefix(&self, guild_id: GuildId, channel_id: ChannelId) -> Option<String>;

    fn dm_prefix(&self, author_id: UserId) -> Option<String>;
}

/// The same prefix everywhere.
#[derive(Debug, Clone)]
pub struct StaticPrefix(pub String);

impl StaticPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }
}

impl PrefixProvider for StaticPrefix {
    fn guild_prefix(&self, _guild_id: GuildId, _channel_id: ChannelId) -> Option<String> {
        Some(self.0.clone())
    }

    fn dm_prefix(&self, _author_id: UserId) -> Option<String> {
        Some(self.0.clone())
    }
}

/// No prefix anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrefix;

impl PrefixProvider for NoPrefix {
    fn guild_prefix(&self, _guild_id: GuildId, _channel_id: ChannelId) -> Option<String> {
        None
    }

    fn dm_prefix(&self, _author_id: UserId) -> Option<String> {
        None
    }
}

/// A default prefix with per-guild overrides. DMs can be left unprefixed.
#[derive(Debug, Clone, Default)]
pub struct GuildPrefixes {
    pub default: Option<String>,
    pub dm: Option<String>,
    pub overrides: HashMap<GuildId, String>,
}

impl PrefixProvider for GuildPrefixes {
    fn guild_prefix(&self, guild_id: GuildId, _channel_id: ChannelId) -> Option<String> {
        self.overrides
            .get(&guild_id)
            .cloned()
            .or_else(|| self.default.clone())
    }

    fn dm_prefix(&self, _author_id: UserId) -> Option<String> {
        self.dm.clone()
    }
}
