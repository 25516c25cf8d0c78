use crate::error::Result;
use crate::models::ChannelId;
use async_trait::async_trait;
use uuid::Uuid;

/// Handle to a message previously sent through a [`Notifier`], so progress
/// notifications can be updated in place ("Retrieving... " -> "... Done").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageRef(Uuid);

impl MessageRef {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageRef {
    fn default() -> Self {
        Self::new()
    }
}

/// Outbound side of the chat transport. Implemented by the hosting bot;
/// failures surface as [`crate::EngineError::Transport`].
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel: &ChannelId, text: &str) -> Result<MessageRef>;
    async fn edit(&self, message: &MessageRef, text: &str) -> Result<()>;
}
