//! `OpenAI`-compatible image client (`/images/generations`).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::config::ImageTimeouts;
use super::types::{AspectRatio, GenerateOptions, GenerationError};

pub struct OpenAiImageClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiImageClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: String, base_url: String, timeouts: ImageTimeouts) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| GenerationError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_key, base_url })
    }

    /// # Errors
    ///
    /// Returns an error on transport failure, non-200 status, or an
    /// unparseable response.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Vec<Vec<u8>>, GenerationError> {
        let body = GenerationsRequest {
            model,
            prompt,
            n: options.number_of_images.max(1),
            size: size_for(options.aspect_ratio),
            response_format: model.starts_with("dall-e").then_some("b64_json"),
        };
        let url = format!("{}/images/generations", self.base_url);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(GenerationError::ApiResponse { status, body: text });
        }
        parse_generations_response(&text)
    }
}

/// Nearest size the images endpoint accepts for a ratio.
pub(crate) fn size_for(ratio: AspectRatio) -> &'static str {
    match ratio {
        AspectRatio::Square => "1024x1024",
        AspectRatio::Portrait | AspectRatio::Tall => "1024x1536",
        AspectRatio::Landscape | AspectRatio::Wide => "1536x1024",
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct GenerationsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a str>,
}

#[derive(Deserialize)]
struct GenerationsResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    #[serde(default)]
    b64_json: Option<String>,
}

pub(crate) fn parse_generations_response(json_text: &str) -> Result<Vec<Vec<u8>>, GenerationError> {
    let parsed: GenerationsResponse =
        serde_json::from_str(json_text).map_err(|e| GenerationError::ApiParse(e.to_string()))?;
    let mut images = Vec::with_capacity(parsed.data.len());
    for encoded in parsed.data.into_iter().filter_map(|d| d.b64_json) {
        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| GenerationError::ApiParse(e.to_string()))?;
        images.push(bytes);
    }
    if images.is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(images)
}

#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;
