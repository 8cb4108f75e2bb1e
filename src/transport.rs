//! Outbound transport abstraction.
//!
//! Handlers, the progress indicator and delivery code talk to the chat
//! transport through the [`Transport`] capability trait instead of a
//! global bot client, so the whole pipeline runs against a fake
//! transport in tests.

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, MessageId, ParseMode};
use tracing::debug;

/// Capability set required by the pipeline: send, edit, delete, photo.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message; returns the id needed for later edit/delete.
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<MessageId>;

    /// Replace the text of a previously sent message.
    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<()>;

    /// Delete a previously sent message.
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()>;

    /// Send a PNG image with a caption.
    async fn send_photo(&self, chat_id: ChatId, png: Vec<u8>, caption: &str) -> Result<()>;
}

/// Edit a message, swallowing the errors that are expected during
/// progress animation (placeholder already replaced or removed, text
/// unchanged). Returns whether the edit went through.
pub async fn edit_message_safe(
    transport: &dyn Transport,
    chat_id: ChatId,
    message_id: MessageId,
    text: &str,
) -> bool {
    match transport.edit_message(chat_id, message_id, text, None).await {
        Ok(()) => true,
        Err(e) => {
            debug!("Message edit skipped: {e}");
            false
        }
    }
}

/// [`Transport`] implementation over the Telegram Bot API.
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Wrap a teloxide bot client.
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<MessageId> {
        let mut req = self.bot.send_message(chat_id, text);
        if let Some(pm) = parse_mode {
            req = req.parse_mode(pm);
        }
        let msg = req
            .await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))?;
        Ok(msg.id)
    }

    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<()> {
        let mut req = self.bot.edit_message_text(chat_id, message_id, text);
        if let Some(pm) = parse_mode {
            req = req.parse_mode(pm);
        }
        req.await
            .map_err(|e| anyhow::anyhow!("Telegram edit error: {e}"))?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.bot
            .delete_message(chat_id, message_id)
            .await
            .map_err(|e| anyhow::anyhow!("Telegram delete error: {e}"))?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: ChatId, png: Vec<u8>, caption: &str) -> Result<()> {
        self.bot
            .send_photo(chat_id, InputFile::memory(png))
            .caption(caption)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| anyhow::anyhow!("Telegram photo error: {e}"))?;
        Ok(())
    }
}
