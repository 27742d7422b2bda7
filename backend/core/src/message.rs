use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, GuildId, MessageId, UserId};

/// The sender of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub bot: bool,
}

impl Author {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            name: name.into(),
            bot: false,
        }
    }
}

/// A "message created" event received from the chat service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub id: MessageId,
    /// Present when the message was posted inside a guild; `None` for DMs.
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub author: Author,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl MessageEvent {
    /// Build a direct-message event.
    pub fn direct(
        id: u64,
        channel_id: u64,
        author: Author,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId(id),
            guild_id: None,
            channel_id: ChannelId(channel_id),
            author,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Build an event posted in a guild channel.
    pub fn in_guild(
        id: u64,
        guild_id: u64,
        channel_id: u64,
        author: Author,
        content: impl Into<String>,
    ) -> Self {
        Self {
            guild_id: Some(GuildId(guild_id)),
            ..Self::direct(id, channel_id, author, content)
        }
    }

    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }
}
