//! # Configuration Module
//!
//! This module defines the bot configuration: credentials, upstream
//! endpoints, timeouts and paging limits. Values come from the environment
//! (optionally seeded from a `.env` file) and fall back to placeholders.

use std::env;
use std::time::Duration;

use teloxide::types::UserId;

use crate::errors::ConfigError;

// Placeholder values used when the environment does not provide credentials
pub const BOT_TOKEN_PLACEHOLDER: &str = "YOUR_BOT_TOKEN_HERE";
pub const CLARIFAI_API_KEY_PLACEHOLDER: &str = "YOUR_CLARIFAI_API_KEY_HERE";
pub const DEFAULT_CHANNEL_ID: &str = "@h2tow";

pub const DEFAULT_SEARCH_URL: &str = "https://www.pinterest.com/resource/BaseSearchResource/get/";
pub const DEFAULT_TAGGER_URL: &str =
    "https://api.clarifai.com/v2/users/clarifai/apps/main/models/general-image-recognition/outputs";

pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEFAULT_SHOW_MORE_COUNT: usize = 5;
pub const DEFAULT_TOP_CONCEPTS: usize = 5;
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_TAGGER_TIMEOUT_SECS: u64 = 30;

/// Pinterest search client settings
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// BaseSearchResource endpoint
    pub endpoint: String,
    /// Maximum number of results kept per search
    pub max_results: usize,
    /// Number of extra results sent by the "show more" button
    pub show_more_count: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            show_more_count: DEFAULT_SHOW_MORE_COUNT,
            timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
        }
    }
}

/// Clarifai image tagger settings
#[derive(Debug, Clone)]
pub struct TaggerConfig {
    pub api_key: String,
    /// Full model outputs URL
    pub model_url: String,
    /// How many top concepts make up a description
    pub top_concepts: usize,
    pub timeout_secs: u64,
}

impl TaggerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            api_key: CLARIFAI_API_KEY_PLACEHOLDER.to_string(),
            model_url: DEFAULT_TAGGER_URL.to_string(),
            top_concepts: DEFAULT_TOP_CONCEPTS,
            timeout_secs: DEFAULT_TAGGER_TIMEOUT_SECS,
        }
    }
}

/// Top-level bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    /// Bot owner, always allowed through the subscription gate
    pub owner_id: Option<UserId>,
    /// Channel users must join when the subscription check is enabled
    pub channel_id: String,
    pub require_subscription: bool,
    pub search: SearchConfig,
    pub tagger: TaggerConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_token: BOT_TOKEN_PLACEHOLDER.to_string(),
            owner_id: None,
            channel_id: DEFAULT_CHANNEL_ID.to_string(),
            require_subscription: false,
            search: SearchConfig::default(),
            tagger: TaggerConfig::default(),
        }
    }
}

impl BotConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Missing keys take their defaults. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let bot_token = get("BOT_TOKEN")
            .or_else(|| get("TELEGRAM_BOT_TOKEN"))
            .unwrap_or(defaults.bot_token);

        // A malformed owner id only disables the owner bypass
        let owner_id = get("OWNER_ID").and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(id) => Some(UserId(id)),
            Err(_) => {
                tracing::warn!(value = %raw, "Ignoring OWNER_ID that is not a numeric user id");
                None
            }
        });

        Ok(Self {
            bot_token,
            owner_id,
            channel_id: get("CHANNEL_ID").unwrap_or(defaults.channel_id),
            require_subscription: parse_bool(
                "REQUIRE_SUBSCRIPTION",
                get("REQUIRE_SUBSCRIPTION"),
                defaults.require_subscription,
            )?,
            search: SearchConfig {
                endpoint: get("PINTEREST_SEARCH_URL").unwrap_or(defaults.search.endpoint),
                max_results: parse_number(
                    "SEARCH_MAX_RESULTS",
                    get("SEARCH_MAX_RESULTS"),
                    defaults.search.max_results,
                )?,
                show_more_count: parse_number(
                    "SHOW_MORE_COUNT",
                    get("SHOW_MORE_COUNT"),
                    defaults.search.show_more_count,
                )?,
                timeout_secs: parse_number(
                    "SEARCH_TIMEOUT_SECS",
                    get("SEARCH_TIMEOUT_SECS"),
                    defaults.search.timeout_secs,
                )?,
            },
            tagger: TaggerConfig {
                api_key: get("CLARIFAI_API_KEY").unwrap_or(defaults.tagger.api_key),
                model_url: get("CLARIFAI_MODEL_URL").unwrap_or(defaults.tagger.model_url),
                top_concepts: parse_number(
                    "TAGGER_TOP_CONCEPTS",
                    get("TAGGER_TOP_CONCEPTS"),
                    defaults.tagger.top_concepts,
                )?,
                timeout_secs: parse_number(
                    "TAGGER_TIMEOUT_SECS",
                    get("TAGGER_TIMEOUT_SECS"),
                    defaults.tagger.timeout_secs,
                )?,
            },
        })
    }

    /// Names of the variables that still hold placeholder credentials
    pub fn placeholder_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.bot_token == BOT_TOKEN_PLACEHOLDER {
            keys.push("BOT_TOKEN");
        }
        if self.tagger.api_key == CLARIFAI_API_KEY_PLACEHOLDER {
            keys.push("CLARIFAI_API_KEY");
        }
        keys
    }
}

fn parse_number<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key,
            value,
            expected: "a non-negative integer",
        }),
    }
}

fn parse_bool(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let normalized = raw.as_deref().map(|v| v.trim().to_ascii_lowercase());
    match normalized {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::InvalidValue {
            key,
            value: raw.unwrap_or_default(),
            expected: "a boolean",
        }),
    }
}
