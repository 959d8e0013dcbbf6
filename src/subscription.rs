//! # Subscription Gate Module
//!
//! Decides whether a user may use the bot. The dispatcher only sees the
//! `SubscriptionGate` trait, so the membership check can be swapped without
//! touching the handlers.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{Recipient, UserId};
use tracing::{debug, warn};

#[async_trait]
pub trait SubscriptionGate: Send + Sync {
    /// `false` on any failure: the gate fails closed
    async fn is_subscribed(&self, user_id: UserId) -> bool;
}

/// Lets everybody through
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSubscribed;

#[async_trait]
impl SubscriptionGate for AlwaysSubscribed {
    async fn is_subscribed(&self, _user_id: UserId) -> bool {
        true
    }
}

/// Requires membership of a Telegram channel, checked with `getChatMember`
pub struct ChannelMembershipGate {
    bot: Bot,
    channel: Recipient,
    owner_id: Option<UserId>,
}

impl ChannelMembershipGate {
    pub fn new(bot: Bot, channel_id: &str, owner_id: Option<UserId>) -> Self {
        Self {
            bot,
            channel: parse_channel(channel_id),
            owner_id,
        }
    }
}

/// `@name` (or a bare name) is a public channel username; a number is a chat id
pub fn parse_channel(channel_id: &str) -> Recipient {
    let trimmed = channel_id.trim();
    match trimmed.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if trimmed.starts_with('@') => Recipient::ChannelUsername(trimmed.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{trimmed}")),
    }
}

#[async_trait]
impl SubscriptionGate for ChannelMembershipGate {
    async fn is_subscribed(&self, user_id: UserId) -> bool {
        if self.owner_id == Some(user_id) {
            return true;
        }

        match self.bot.get_chat_member(self.channel.clone(), user_id).await {
            Ok(member) => {
                let present = member.kind.is_present();
                debug!(user_id = %user_id, present, "Checked channel membership");
                present
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Channel membership check failed");
                false
            }
        }
    }
}
