use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::action::OutgoingAction;
use crate::types::UserId;

/// The narrow view of a chat-service connection that the command engine needs.
///
/// Gateway handling, reconnects and rate limits live behind implementations of
/// this trait; the engine only ever pushes actions out.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Human-readable client name for logging.
    fn name(&self) -> &str;

    /// The bot's own user id, used for mention-as-prefix detection.
    fn self_id(&self) -> Option<UserId> {
        None
    }

    /// Perform one outgoing action.
    async fn send(&self, action: OutgoingAction) -> Result<()>;
}

/// A client that records every action instead of sending it.
///
/// Used by the console front-end and throughout the test suites.
#[derive(Default)]
pub struct RecordingClient {
    self_id: Option<UserId>,
    sent: Mutex<Vec<OutgoingAction>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_self_id(self_id: UserId) -> Self {
        Self {
            self_id: Some(self_id),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything sent so far.
    pub async fn sent(&self) -> Vec<OutgoingAction> {
        self.sent.lock().await.clone()
    }

    /// Remove and return everything sent so far.
    pub async fn drain(&self) -> Vec<OutgoingAction> {
        std::mem::take(&mut *self.sent.lock().await)
    }
}

#[async_trait]
impl ChatClient for RecordingClient {
    fn name(&self) -> &str {
        "recording"
    }

    fn self_id(&self) -> Option<UserId> {
        self.self_id
    }

    async fn send(&self, action: OutgoingAction) -> Result<()> {
        debug!(channel = %action.channel_id(), "Recording outgoing action");
        self.sent.lock().await.push(action);
        Ok(())
    }
}
