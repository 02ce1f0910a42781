//! Outbound notifications for registration lifecycle transitions.

pub mod message;
pub mod telegram;

use async_trait::async_trait;

pub use message::{notify_abandonment, notify_completion};
pub use telegram::TelegramSink;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("messaging sink returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("messaging sink request failed: {0}")]
    Transport(String),
    #[error("messaging sink is misconfigured: {0}")]
    Config(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Transport(err.to_string())
    }
}

/// A chat destination that accepts text and photos.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<(), NotifyError>;

    async fn send_photo(&self, url: &str, caption: &str) -> Result<(), NotifyError>;

    /// Send two or more photos as one grouped message, without captions.
    async fn send_photo_group(&self, urls: &[String]) -> Result<(), NotifyError>;
}

/// Sink used when no messaging backend is configured; logs and succeeds.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl MessageSink for LogSink {
    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        tracing::info!(target: "notify", %text, "Notification (sink disabled)");
        Ok(())
    }

    async fn send_photo(&self, url: &str, caption: &str) -> Result<(), NotifyError> {
        tracing::info!(target: "notify", %url, %caption, "Photo notification (sink disabled)");
        Ok(())
    }

    async fn send_photo_group(&self, urls: &[String]) -> Result<(), NotifyError> {
        tracing::info!(target: "notify", count = urls.len(), "Photo group notification (sink disabled)");
        Ok(())
    }
}
