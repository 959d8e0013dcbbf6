//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::PhotoSize;
use tracing::debug;

use super::search_flow::{SearchBot, UserContext};

/// Name of the bot command in `text`, without the leading slash or a
/// `@botname` suffix. `None` when the text is not a command.
pub fn command_name(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('/')?;
    let word = rest.split_whitespace().next().unwrap_or("");
    word.split('@').next()
}

/// The photo size with the most pixels
pub fn largest_photo(photos: &[PhotoSize]) -> Option<&PhotoSize> {
    photos
        .iter()
        .max_by_key(|photo| u64::from(photo.width) * u64::from(photo.height))
}

pub async fn message_handler(msg: Message, search_bot: Arc<SearchBot>) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        debug!(chat_id = %msg.chat.id, "Ignoring message without a sender");
        return Ok(());
    };
    let from = UserContext::from_user(user, msg.chat.id);

    if let Some(text) = msg.text() {
        match command_name(text) {
            Some("start") => search_bot.handle_start(&from).await?,
            Some(command) => debug!(user_id = %from.user_id, command = %command, "Ignoring unknown command"),
            None => search_bot.handle_text(&from, text).await?,
        }
    } else if let Some(photo) = msg.photo().and_then(largest_photo) {
        search_bot.handle_photo(&from, &photo.file.id.to_string()).await?;
    } else {
        debug!(user_id = %from.user_id, "Ignoring unsupported message type");
    }

    Ok(())
}
