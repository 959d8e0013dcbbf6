//! Outbound chat operations used by the search flows.
//!
//! `ChatApi` is the seam between the flows and Telegram: `TelegramChat` talks
//! to the Bot API, tests substitute a recording implementation.

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, MessageId, ParseMode};

use super::ui_builder::{create_result_keyboard, PhotoReply};

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageId>;
    async fn edit_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> Result<()>;
    async fn edit_caption(&self, chat_id: ChatId, message_id: MessageId, caption: &str) -> Result<()>;
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()>;
    async fn send_photo(&self, chat_id: ChatId, reply: &PhotoReply) -> Result<MessageId>;
    /// Publicly fetchable URL of an uploaded file
    async fn file_url(&self, file_id: &str) -> Result<String>;
}

/// `ChatApi` backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramChat {
    bot: Bot,
}

impl TelegramChat {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatApi for TelegramChat {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageId> {
        let sent = self.bot.send_message(chat_id, text).await?;
        Ok(sent.id)
    }

    async fn edit_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> Result<()> {
        self.bot.edit_message_text(chat_id, message_id, text).await?;
        Ok(())
    }

    async fn edit_caption(&self, chat_id: ChatId, message_id: MessageId, caption: &str) -> Result<()> {
        self.bot
            .edit_message_caption(chat_id, message_id)
            .caption(caption)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.bot.delete_message(chat_id, message_id).await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: ChatId, reply: &PhotoReply) -> Result<MessageId> {
        let image_url = reqwest::Url::parse(&reply.image_url)?;
        let mut request = self
            .bot
            .send_photo(chat_id, InputFile::url(image_url))
            .caption(reply.caption.clone())
            .parse_mode(ParseMode::Html);

        if let Some(keyboard) = create_result_keyboard(&reply.buttons) {
            request = request.reply_markup(keyboard);
        }

        let sent = request.await?;
        Ok(sent.id)
    }

    async fn file_url(&self, file_id: &str) -> Result<String> {
        let file = self.bot.get_file(FileId::from(file_id.to_string())).await?;
        Ok(format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot.token(),
            file.path
        ))
    }
}
