//! Search flows behind every bot entry point.
//!
//! `SearchBot` owns the service seams (chat, search, tagger, gate) and the
//! per-user result store. The teloxide handlers only translate updates into
//! calls on it.

use std::sync::Arc;

use anyhow::Result;
use teloxide::types::{ChatId, MessageId, User, UserId};
use tracing::{debug, error, info, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import service seams
use crate::pinterest::PinSearch;
use crate::result_store::ResultStore;
use crate::subscription::SubscriptionGate;
use crate::tagger::ImageTagger;

use super::chat::ChatApi;
use super::ui_builder::{extra_result_reply, first_result_reply, parse_show_more_data, QueryOrigin};

/// Who sent an update and where to answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub language_code: Option<String>,
}

impl UserContext {
    pub fn from_user(user: &User, chat_id: ChatId) -> Self {
        Self {
            user_id: user.id,
            chat_id,
            language_code: user.language_code.clone(),
        }
    }

    fn lang(&self) -> Option<&str> {
        self.language_code.as_deref()
    }
}

/// Paging limits and the channel named in the not-subscribed message
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub max_results: usize,
    pub show_more_count: usize,
    pub channel_id: String,
}

pub struct SearchBot {
    chat: Arc<dyn ChatApi>,
    searcher: Arc<dyn PinSearch>,
    tagger: Arc<dyn ImageTagger>,
    gate: Arc<dyn SubscriptionGate>,
    results: ResultStore,
    settings: SearchSettings,
}

impl SearchBot {
    pub fn new(
        chat: Arc<dyn ChatApi>,
        searcher: Arc<dyn PinSearch>,
        tagger: Arc<dyn ImageTagger>,
        gate: Arc<dyn SubscriptionGate>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            chat,
            searcher,
            tagger,
            gate,
            results: ResultStore::new(),
            settings,
        }
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    /// Run the gate; on denial tell the user and return `false`
    async fn ensure_subscribed(&self, from: &UserContext) -> Result<bool> {
        if self.gate.is_subscribed(from.user_id).await {
            return Ok(true);
        }

        info!(user_id = %from.user_id, "User is not subscribed, refusing service");
        let text = t_args_lang(
            "not-subscribed",
            &[("channel", self.settings.channel_id.as_str())],
            from.lang(),
        );
        self.chat.send_text(from.chat_id, &text).await?;
        Ok(false)
    }

    /// Handle the /start command
    pub async fn handle_start(&self, from: &UserContext) -> Result<()> {
        if !self.ensure_subscribed(from).await? {
            return Ok(());
        }
        debug!(user_id = %from.user_id, "Sending welcome message");
        self.chat.send_text(from.chat_id, &t_lang("start", from.lang())).await?;
        Ok(())
    }

    /// Search with a description of the photo identified by `file_id`
    pub async fn handle_photo(&self, from: &UserContext, file_id: &str) -> Result<()> {
        if !self.ensure_subscribed(from).await? {
            return Ok(());
        }
        debug!(user_id = %from.user_id, "Received photo search");

        let placeholder = self
            .chat
            .send_text(from.chat_id, &t_lang("processing", from.lang()))
            .await?;

        if let Err(e) = self.search_photo(from, placeholder, file_id).await {
            error!(user_id = %from.user_id, error = %e, "Photo search failed");
            self.report_failure(from, placeholder).await;
        }
        Ok(())
    }

    /// Search with the literal text the user typed
    pub async fn handle_text(&self, from: &UserContext, text: &str) -> Result<()> {
        if !self.ensure_subscribed(from).await? {
            return Ok(());
        }
        debug!(user_id = %from.user_id, query = %text, "Received text search");

        let placeholder = self
            .chat
            .send_text(from.chat_id, &t_lang("processing", from.lang()))
            .await?;

        let origin = QueryOrigin::Typed(text.to_string());
        if let Err(e) = self.search_and_reply(from, placeholder, origin).await {
            error!(user_id = %from.user_id, error = %e, "Text search failed");
            self.report_failure(from, placeholder).await;
        }
        Ok(())
    }

    /// Handle a "show more" button press on `message_id`.
    ///
    /// Sends stored results 1..=show_more_count of the presser and then marks
    /// the original message as complete. Nothing happens with fewer than two
    /// stored results.
    pub async fn handle_show_more(&self, from: &UserContext, message_id: MessageId, data: &str) -> Result<()> {
        let Some(owner) = parse_show_more_data(data) else {
            debug!(user_id = %from.user_id, data = %data, "Ignoring unknown callback data");
            return Ok(());
        };

        if !self.ensure_subscribed(from).await? {
            return Ok(());
        }

        if owner != from.user_id {
            // The presser's own results are used either way
            warn!(
                user_id = %from.user_id,
                button_owner = %owner,
                "Show more pressed by a different user than the button was created for"
            );
        }

        let Some(results) = self.results.get(from.user_id).await else {
            debug!(user_id = %from.user_id, "No stored results for show more");
            return Ok(());
        };
        if results.len() <= 1 {
            debug!(user_id = %from.user_id, "Nothing more to show");
            return Ok(());
        }

        let mut sent = 0;
        for (index, result) in results
            .iter()
            .enumerate()
            .skip(1)
            .take(self.settings.show_more_count)
        {
            let reply = extra_result_reply(index, result, from.lang());
            match self.chat.send_photo(from.chat_id, &reply).await {
                Ok(_) => sent += 1,
                Err(e) => warn!(
                    user_id = %from.user_id,
                    index,
                    image_url = %result.image_url,
                    error = %e,
                    "Skipping result that could not be sent"
                ),
            }
        }

        self.chat
            .edit_caption(from.chat_id, message_id, &t_lang("all-shown", from.lang()))
            .await?;
        info!(user_id = %from.user_id, sent, "Sent additional results");
        Ok(())
    }

    async fn search_photo(&self, from: &UserContext, placeholder: MessageId, file_id: &str) -> Result<()> {
        let image_url = self.chat.file_url(file_id).await?;

        let description = match self.tagger.describe(&image_url).await {
            Ok(description) => description,
            Err(e) => {
                warn!(user_id = %from.user_id, error = %e, "Could not describe photo");
                self.chat
                    .edit_text(from.chat_id, placeholder, &t_lang("error", from.lang()))
                    .await?;
                return Ok(());
            }
        };

        self.search_and_reply(from, placeholder, QueryOrigin::Described(description))
            .await
    }

    async fn search_and_reply(&self, from: &UserContext, placeholder: MessageId, origin: QueryOrigin) -> Result<()> {
        let results = match self
            .searcher
            .search(origin.text(), self.settings.max_results)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                warn!(
                    user_id = %from.user_id,
                    query = %origin.text(),
                    error = %e,
                    "Search call failed, answering as no results"
                );
                Vec::new()
            }
        };

        let Some(reply) = first_result_reply(&origin, &results, from.user_id, from.lang()) else {
            info!(user_id = %from.user_id, query = %origin.text(), "Search returned no results");
            self.chat
                .edit_text(from.chat_id, placeholder, &t_lang("no-results", from.lang()))
                .await?;
            return Ok(());
        };

        self.chat.send_photo(from.chat_id, &reply).await?;
        if let Err(e) = self.chat.delete_message(from.chat_id, placeholder).await {
            warn!(user_id = %from.user_id, error = %e, "Failed to delete processing message");
        }

        info!(user_id = %from.user_id, results = results.len(), "Sent first search result");
        self.results.store(from.user_id, results).await;
        Ok(())
    }

    /// Edit the placeholder to the error text, or send it fresh when the
    /// placeholder can no longer be edited
    async fn report_failure(&self, from: &UserContext, placeholder: MessageId) {
        let text = t_lang("error", from.lang());
        let Err(e) = self.chat.edit_text(from.chat_id, placeholder, &text).await else {
            return;
        };
        debug!(user_id = %from.user_id, error = %e, "Placeholder not editable, sending error as a new message");

        if let Err(e) = self.chat.send_text(from.chat_id, &text).await {
            error!(user_id = %from.user_id, error = %e, "Failed to report error to user");
        }
    }
}
