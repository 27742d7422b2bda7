//! Console chat client: stdin lines become message events, outgoing actions
//! are printed to stdout.

use std::io::Write;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use cmdbot_core::{Author, ChatClient, MessageEvent, OutgoingAction, UserId};

use crate::config::Config;

pub struct ConsoleClient {
    self_id: UserId,
    json: bool,
}

impl ConsoleClient {
    pub fn new(self_id: UserId, json: bool) -> Self {
        Self { self_id, json }
    }

    /// The line printed for one action.
    pub fn render(&self, action: &OutgoingAction) -> Result<String> {
        if self.json {
            return Ok(serde_json::to_string(action)?);
        }
        Ok(match action {
            OutgoingAction::Text { content, .. } => content.clone(),
            OutgoingAction::Embed { embed, .. } => embed.to_plain_text(),
            OutgoingAction::Reaction { message_id, emoji, .. } => {
                format!("(reacted {emoji} to message {message_id})")
            }
        })
    }
}

#[async_trait]
impl ChatClient for ConsoleClient {
    fn name(&self) -> &str {
        "console"
    }

    fn self_id(&self) -> Option<UserId> {
        Some(self.self_id)
    }

    async fn send(&self, action: OutgoingAction) -> Result<()> {
        let line = self.render(&action)?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}").context("Failed to write to stdout")?;
        Ok(())
    }
}

/// Builds message events for the configured console identity.
pub struct EventFactory {
    next_id: u64,
    author: Author,
    guild_id: Option<u64>,
    channel_id: u64,
}

impl EventFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            next_id: 1,
            author: Author::new(config.author_id, config.author_name.clone()),
            guild_id: config.guild_id,
            channel_id: config.channel_id,
        }
    }

    pub fn event(&mut self, content: &str) -> MessageEvent {
        let id = self.next_id;
        self.next_id += 1;
        match self.guild_id {
            Some(guild) => MessageEvent::in_guild(id, guild, self.channel_id, self.author.clone(), content),
            None => MessageEvent::direct(id, self.channel_id, self.author.clone(), content),
        }
    }
}

/// Forward stdin lines to `events` until EOF.
pub async fn read_stdin(mut factory: EventFactory, events: mpsc::Sender<MessageEvent>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        debug!(len = line.len(), "Console line");
        if events.send(factory.event(&line)).await.is_err() {
            break;
        }
    }
    Ok(())
}
