//! HTTP-backed collaborators
//!
//! `HttpOutputTypeClassifier` posts to the canvas AI service's classify
//! endpoint. `HttpTextGenerator` talks to an Ollama-compatible
//! `/api/generate` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use canvas_engine::NodeType;
use serde::{Deserialize, Serialize};

use super::{OutputTypeClassifier, ServiceError, TextGenerator, TextInputs};
use crate::config::HttpServiceConfig;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyRequest<'a> {
    instruction: &'a str,
    input_types: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyResponse {
    output_type: String,
}

/// Response structure from the Ollama generate API
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

fn build_client(config: &HttpServiceConfig) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .build()
        .map_err(|e| ServiceError::Unavailable(format!("Failed to build HTTP client: {}", e)))
}

async fn post_json<T, R>(client: &reqwest::Client, url: &str, body: &T) -> Result<R, ServiceError>
where
    T: Serialize + ?Sized,
    R: for<'de> Deserialize<'de>,
{
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| ServiceError::Unavailable(format!("Failed to reach {}: {}", url, e)))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        return Err(ServiceError::Status { status, message });
    }

    response
        .json()
        .await
        .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
}

/// Classifier backed by `POST {baseUrl}/api/classify`
pub struct HttpOutputTypeClassifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOutputTypeClassifier {
    pub fn new(config: &HttpServiceConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/api/classify", self.base_url)
    }
}

#[async_trait]
impl OutputTypeClassifier for HttpOutputTypeClassifier {
    async fn classify(&self, instruction: &str, input_types: &[NodeType]) -> Result<String, ServiceError> {
        let request = ClassifyRequest {
            instruction,
            input_types: input_types.iter().map(|t| t.as_str()).collect(),
        };
        let url = self.url();
        log::debug!(
            "Classifying instruction ({} chars, inputs {:?}) via {}",
            instruction.len(),
            request.input_types,
            url
        );

        let response: ClassifyResponse = post_json(&self.client, &url, &request).await?;
        Ok(response.output_type)
    }
}

/// Text generation through an Ollama-compatible server
pub struct HttpTextGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl HttpTextGenerator {
    pub fn new(config: &HttpServiceConfig, model: impl Into<String>) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    fn request_body(&self, inputs: &TextInputs) -> serde_json::Value {
        let mut prompt = inputs.texts.join("\n\n");
        for url in &inputs.image_urls {
            if !prompt.is_empty() {
                prompt.push_str("\n\n");
            }
            prompt.push_str("Image: ");
            prompt.push_str(url);
        }
        serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        })
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, inputs: &TextInputs) -> Result<String, ServiceError> {
        let url = format!("{}/api/generate", self.base_url);
        log::debug!("Generating text with model '{}' via {}", self.model, url);

        let response: GenerateResponse = post_json(&self.client, &url, &self.request_body(inputs)).await?;
        Ok(response.response)
    }
}
