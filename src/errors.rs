//! # Error Types Module
//!
//! Typed errors for the two upstream clients and for configuration loading.
//! Callers can tell "the call failed" apart from "the call succeeded with
//! nothing to show".

use thiserror::Error;

/// Errors returned by the Pinterest search client
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network failure, timeout or client construction failure
    #[error("Search request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The endpoint answered with a non-success status
    #[error("Search endpoint returned HTTP {0}")]
    Status(reqwest::StatusCode),
    /// The body was not JSON at all
    #[error("Search response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    /// The body was JSON but one of the expected levels had the wrong type
    #[error("Unexpected search response shape: {0}")]
    UnexpectedShape(String),
}

/// Errors returned by the image tagging client
#[derive(Debug, Error)]
pub enum TaggerError {
    #[error("Tagger request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Tagger endpoint returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("Tagger response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    /// The API reported a failure status inside an otherwise valid response
    #[error("Tagger API error {code}: {description}")]
    Api { code: u32, description: String },
    #[error("Unexpected tagger response shape: {0}")]
    UnexpectedShape(String),
    /// The model recognised nothing in the image
    #[error("Tagger returned no concepts")]
    NoConcepts,
}

/// Errors raised while reading configuration from the environment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: expected {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}
