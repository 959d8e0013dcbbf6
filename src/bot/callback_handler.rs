//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error};

use super::search_flow::{SearchBot, UserContext};

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, search_bot: Arc<SearchBot>) -> Result<()> {
    debug!(user_id = %q.from.id, "Received callback query from user");

    // Answer first to remove the loading state on the button
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(msg) = &q.message else {
        debug!(user_id = %q.from.id, "Callback query without an accessible message");
        return Ok(());
    };
    let data = q.data.as_deref().unwrap_or("");
    let from = UserContext::from_user(&q.from, msg.chat().id);

    if let Err(e) = search_bot.handle_show_more(&from, msg.id(), data).await {
        error!(user_id = %q.from.id, error = %e, "Failed to handle show more");
    }

    Ok(())
}
