use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, MessageId};

/// One field of an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Rich message content. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    /// RGB packed as `0xRRGGBB`.
    pub color: Option<u32>,
    pub footer: Option<String>,
    pub thumbnail_url: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, rgb: u32) -> Self {
        self.color = Some(rgb);
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    /// Flatten the embed into plain text, for clients that cannot render embeds.
    pub fn to_plain_text(&self) -> String {
        let mut lines = Vec::new();
        if let Some(author) = &self.author {
            lines.push(format!("[{author}]"));
        }
        if let Some(title) = &self.title {
            lines.push(format!("== {title} =="));
        }
        if let Some(description) = &self.description {
            lines.push(description.clone());
        }
        for field in &self.fields {
            lines.push(format!("• {}: {}", field.name, field.value));
        }
        if let Some(footer) = &self.footer {
            lines.push(format!("-- {footer}"));
        }
        lines.join("\n")
    }
}

/// An effect on the chat service produced by a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingAction {
    /// Post a plain text message.
    Text { channel_id: ChannelId, content: String },
    /// Post an embed.
    Embed { channel_id: ChannelId, embed: Embed },
    /// React to an existing message with a unicode emoji.
    Reaction {
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
    },
}

impl OutgoingAction {
    pub fn text(channel_id: ChannelId, content: impl Into<String>) -> Self {
        Self::Text {
            channel_id,
            content: content.into(),
        }
    }

    pub fn channel_id(&self) -> ChannelId {
        match self {
            Self::Text { channel_id, .. }
            | Self::Embed { channel_id, .. }
            | Self::Reaction { channel_id, .. } => *channel_id,
        }
    }
}
