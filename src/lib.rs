//! # Pinterest Search Telegram Bot
//!
//! A Telegram bot that finds Pinterest images for a typed query or for a
//! photo, describing the photo first with an image recognition API.

pub mod bot;
pub mod config;
pub mod errors;
pub mod localization;
pub mod pinterest;
pub mod result_store;
pub mod subscription;
pub mod tagger;
