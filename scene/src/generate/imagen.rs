//! Google Imagen client (`models/{model}:predict`).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::config::ImageTimeouts;
use super::types::{GenerateOptions, GenerationError};

pub struct ImagenClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ImagenClient {
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
        let body = PredictRequest {
            instances: [Instance { prompt }],
            parameters: Parameters {
                sample_count: options.number_of_images.max(1),
                aspect_ratio: options.aspect_ratio.as_str(),
            },
        };
        let url = format!("{}/models/{model}:predict", self.base_url);
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
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
        parse_predict_response(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: [Instance<'a>; 1],
    parameters: Parameters<'a>,
}

#[derive(Serialize)]
struct Instance<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters<'a> {
    sample_count: u32,
    aspect_ratio: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
}

/// Decode every base64 image in a `:predict` response.
///
/// Predictions without image bytes (filtered by safety settings) are skipped.
pub(crate) fn parse_predict_response(json_text: &str) -> Result<Vec<Vec<u8>>, GenerationError> {
    let parsed: PredictResponse =
        serde_json::from_str(json_text).map_err(|e| GenerationError::ApiParse(e.to_string()))?;
    let mut images = Vec::with_capacity(parsed.predictions.len());
    for encoded in parsed.predictions.into_iter().filter_map(|p| p.bytes_base64_encoded) {
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
#[path = "imagen_test.rs"]
mod tests;
