//! # Image Tagger Module
//!
//! Turns an image URL into a short description by asking Clarifai's general
//! image recognition model for concepts and joining the strongest ones.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::TaggerConfig;
use crate::errors::TaggerError;

/// Clarifai's status code for a successful prediction
pub const CLARIFAI_SUCCESS: u32 = 10000;

/// Anything that can describe an image reachable by URL
#[async_trait]
pub trait ImageTagger: Send + Sync {
    async fn describe(&self, image_url: &str) -> Result<String, TaggerError>;
}

/// A recognised label and the model's confidence in it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Concept {
    pub name: String,
    pub value: f32,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    status: Option<ApiStatus>,
    outputs: Option<Vec<PredictOutput>>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    code: u32,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PredictOutput {
    data: Option<OutputData>,
}

#[derive(Debug, Deserialize)]
struct OutputData {
    concepts: Option<Vec<Concept>>,
}

/// Join the names of the `top` most confident concepts with ", "
pub fn describe_concepts(mut concepts: Vec<Concept>, top: usize) -> Option<String> {
    concepts.sort_by(|a, b| b.value.total_cmp(&a.value));
    let names: Vec<String> = concepts.into_iter().take(top).map(|c| c.name).collect();
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

/// Pull `outputs[0].data.concepts` out of a prediction response
pub fn parse_concepts(body: Value) -> Result<Vec<Concept>, TaggerError> {
    let response: PredictResponse =
        serde_json::from_value(body).map_err(|e| TaggerError::UnexpectedShape(e.to_string()))?;

    if let Some(status) = response.status {
        if status.code != CLARIFAI_SUCCESS {
            return Err(TaggerError::Api {
                code: status.code,
                description: status.description.unwrap_or_default(),
            });
        }
    }

    response
        .outputs
        .and_then(|outputs| outputs.into_iter().next())
        .and_then(|output| output.data)
        .and_then(|data| data.concepts)
        .ok_or_else(|| TaggerError::UnexpectedShape("missing outputs[0].data.concepts".to_string()))
}

/// Clarifai REST client
#[derive(Debug, Clone)]
pub struct ClarifaiTagger {
    client: reqwest::Client,
    api_key: String,
    model_url: String,
    top_concepts: usize,
}

impl ClarifaiTagger {
    pub fn new(config: &TaggerConfig) -> Result<Self, TaggerError> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model_url: config.model_url.clone(),
            top_concepts: config.top_concepts,
        })
    }
}

#[async_trait]
impl ImageTagger for ClarifaiTagger {
    async fn describe(&self, image_url: &str) -> Result<String, TaggerError> {
        debug!(model_url = %self.model_url, "Requesting image concepts");

        let request_body = json!({
            "inputs": [{
                "data": {
                    "image": { "url": image_url }
                }
            }]
        });

        let response = self
            .client
            .post(&self.model_url)
            .header(AUTHORIZATION, format!("Key {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Image tagger returned an error status");
            return Err(TaggerError::Status(status));
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        let concepts = parse_concepts(body)?;
        let found = concepts.len();

        let description = describe_concepts(concepts, self.top_concepts).ok_or(TaggerError::NoConcepts)?;
        info!(concepts = found, description = %description, "Image described");
        Ok(description)
    }
}
