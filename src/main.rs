use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use pinsearch::bot::{callback_handler, message_handler, SearchBot, SearchSettings, TelegramChat};
use pinsearch::config::BotConfig;
use pinsearch::localization::init_localization;
use pinsearch::pinterest::{PinSearch, PinterestClient};
use pinsearch::subscription::{AlwaysSubscribed, ChannelMembershipGate, SubscriptionGate};
use pinsearch::tagger::{ClarifaiTagger, ImageTagger};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();
    info!("Starting Pinterest search bot");

    let config = BotConfig::from_env()?;
    for key in config.placeholder_keys() {
        warn!(variable = key, "Configuration still holds a placeholder value");
    }

    init_localization();

    let bot = Bot::new(config.bot_token.clone());

    let searcher: Arc<dyn PinSearch> = Arc::new(PinterestClient::new(&config.search)?);
    let tagger: Arc<dyn ImageTagger> = Arc::new(ClarifaiTagger::new(&config.tagger)?);
    let gate: Arc<dyn SubscriptionGate> = if config.require_subscription {
        info!(channel = %config.channel_id, "Channel subscription required");
        Arc::new(ChannelMembershipGate::new(bot.clone(), &config.channel_id, config.owner_id))
    } else {
        Arc::new(AlwaysSubscribed)
    };

    let search_bot = Arc::new(SearchBot::new(
        Arc::new(TelegramChat::new(bot.clone())),
        searcher,
        tagger,
        gate,
        SearchSettings {
            max_results: config.search.max_results,
            show_more_count: config.search.show_more_count,
            channel_id: config.channel_id.clone(),
        },
    ));

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint({
            let search_bot = Arc::clone(&search_bot);
            move |msg: Message| {
                let search_bot = Arc::clone(&search_bot);
                async move { message_handler(msg, search_bot).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let search_bot = Arc::clone(&search_bot);
            move |bot: Bot, q: CallbackQuery| {
                let search_bot = Arc::clone(&search_bot);
                async move { callback_handler(bot, q, search_bot).await }
            }
        }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
