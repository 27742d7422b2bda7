pub mod action;
pub mod error;
pub mod exit;
pub mod message;
pub mod traits;
pub mod types;

pub use action::{Embed, EmbedField, OutgoingAction};
pub use error::BotError;
pub use exit::ExitSignal;
pub use message::{Author, MessageEvent};
pub use traits::{ChatClient, RecordingClient};
pub use types::{ChannelId, GuildId, MessageId, RoleId, UserId};
