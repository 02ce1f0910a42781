use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use crate::config::NotifierConfig;

use super::{MessageSink, NotifyError};

/// Telegram's limit on photo captions, in characters.
const MAX_CAPTION_CHARS: usize = 1024;

/// Messaging sink backed by the Telegram Bot API.
pub struct TelegramSink {
    client: reqwest::Client,
    base: String,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(config: &NotifierConfig) -> Result<Self, NotifyError> {
        if config.bot_token.trim().is_empty() {
            return Err(NotifyError::Config("notifier.bot_token is empty".into()));
        }
        if config.chat_id.trim().is_empty() {
            return Err(NotifyError::Config("notifier.chat_id is empty".into()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base: format!(
                "{}/bot{}",
                config.api_base.trim_end_matches('/'),
                config.bot_token.trim()
            ),
            chat_id: config.chat_id.trim().to_string(),
        })
    }

    async fn call<B: Serialize + ?Sized>(&self, method: &str, body: &B) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".into());
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        tracing::debug!(method, "Telegram call succeeded");
        Ok(())
    }
}

fn truncate_caption(caption: &str) -> String {
    if caption.chars().count() <= MAX_CAPTION_CHARS {
        return caption.to_string();
    }
    let mut cut: String = caption.chars().take(MAX_CAPTION_CHARS - 1).collect();
    cut.push('…');
    cut
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        self.call(
            "sendMessage",
            &json!({ "chat_id": self.chat_id, "text": text }),
        )
        .await
    }

    async fn send_photo(&self, url: &str, caption: &str) -> Result<(), NotifyError> {
        self.call(
            "sendPhoto",
            &json!({
                "chat_id": self.chat_id,
                "photo": url,
                "caption": truncate_caption(caption),
            }),
        )
        .await
    }

    async fn send_photo_group(&self, urls: &[String]) -> Result<(), NotifyError> {
        let media: Vec<_> = urls
            .iter()
            .map(|url| json!({ "type": "photo", "media": url }))
            .collect();
        self.call(
            "sendMediaGroup",
            &json!({ "chat_id": self.chat_id, "media": media }),
        )
        .await
    }
}
