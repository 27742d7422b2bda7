/// Per-invocation context handed to mappers and handlers.
use std::fmt;
use std::sync::Arc;

use cmdbot_core::{ChannelId, ChatClient, GuildId, MessageEvent, OutgoingAction, UserId};

use crate::registry::CommandRegistry;
use crate::tokenizer::Tokens;

/// Everything known about one command invocation.
///
/// Owned by exactly one dispatch; never shared between invocations.
#[derive(Clone)]
pub struct CommandContext {
    pub event: Arc<MessageEvent>,
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    /// Name of the resolved command (never an alias).
    pub command: String,
    /// Tokens left after the prefix and command name were stripped.
    pub tokens: Tokens,
    pub owner_id: Option<UserId>,
    pub client: Arc<dyn ChatClient>,
    pub registry: Arc<CommandRegistry>,
}

impl CommandContext {
    pub fn new(
        event: Arc<MessageEvent>,
        client: Arc<dyn ChatClient>,
        registry: Arc<CommandRegistry>,
    ) -> Self {
        Self {
            guild_id: event.guild_id,
            channel_id: event.channel_id,
            author_id: event.author.id,
            command: String::new(),
            tokens: Tokens::new(),
            owner_id: None,
            event,
            client,
            registry,
        }
    }

    pub fn with_owner(mut self, owner_id: Option<UserId>) -> Self {
        self.owner_id = owner_id;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>, tokens: Tokens) -> Self {
        self.command = command.into();
        self.tokens = tokens;
        self
    }

    /// Invoked from a direct-message channel rather than a guild.
    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }

    pub fn is_owner(&self) -> bool {
        self.owner_id == Some(self.author_id)
    }

    /// A text action answering in the invoking channel.
    pub fn reply(&self, content: impl Into<String>) -> OutgoingAction {
        OutgoingAction::text(self.channel_id, content)
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("message", &self.event.id)
            .field("guild_id", &self.guild_id)
            .field("channel_id", &self.channel_id)
            .field("author_id", &self.author_id)
            .field("command", &self.command)
            .field("tokens", &self.tokens)
            .field("client", &self.client.name())
            .finish()
    }
}
