//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Handles incoming commands, text and photo messages
//! - `callback_handler`: Handles the "show more" callback queries
//! - `search_flow`: The search flows shared by every entry point
//! - `chat`: Outbound chat operations and their Telegram implementation
//! - `ui_builder`: Creates keyboards and formats captions

pub mod callback_handler;
pub mod chat;
pub mod message_handler;
pub mod search_flow;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

pub use chat::{ChatApi, TelegramChat};
pub use search_flow::{SearchBot, SearchSettings, UserContext};
