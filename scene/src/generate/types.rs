//! Generation types — provider-neutral request options, the generator trait,
//! and errors shared by the Imagen and `OpenAI` clients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by image-generation operations.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The required API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// The HTTP request to the provider failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The provider returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The provider response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The call succeeded but produced no image data.
    #[error("generation returned no images")]
    Empty,

    /// The returned bytes are not a decodable image.
    #[error("generated image could not be decoded: {0}")]
    Decode(String),

    /// No async runtime is available to run the request on.
    #[error("no async runtime available for generation")]
    NoRuntime,
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Aspect ratios accepted by the generation capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "9:16")]
    Tall,
    #[serde(rename = "16:9")]
    Wide,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [Self::Square, Self::Portrait, Self::Landscape, Self::Tall, Self::Wide];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "3:4",
            Self::Landscape => "4:3",
            Self::Tall => "9:16",
            Self::Wide => "16:9",
        }
    }

    /// Width divided by height.
    #[must_use]
    pub fn ratio(self) -> f64 {
        match self {
            Self::Square => 1.0,
            Self::Portrait => 3.0 / 4.0,
            Self::Landscape => 4.0 / 3.0,
            Self::Tall => 9.0 / 16.0,
            Self::Wide => 16.0 / 9.0,
        }
    }

    /// The supported ratio closest to `width / height` (compared in log space).
    #[must_use]
    pub fn closest(width: f64, height: f64) -> Self {
        if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
            return Self::Square;
        }
        let target = (width / height).ln();
        let mut best = Self::Square;
        let mut best_dist = f64::INFINITY;
        for candidate in Self::ALL {
            let dist = (candidate.ratio().ln() - target).abs();
            if dist < best_dist {
                best = candidate;
                best_dist = dist;
            }
        }
        best
    }
}

impl FromStr for AspectRatio {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| GenerationError::ConfigParse(format!("unsupported aspect ratio: {s}")))
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options passed through to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    pub aspect_ratio: AspectRatio,
    pub number_of_images: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self { aspect_ratio: AspectRatio::Square, number_of_images: 1 }
    }
}

// =============================================================================
// GENERATOR TRAIT
// =============================================================================

/// The external image-generation capability.
///
/// Implementations return encoded raster buffers (PNG/JPEG). The engine
/// treats the call as an opaque, fallible black box.
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_images(&self, prompt: &str, options: &GenerateOptions) -> Result<Vec<Vec<u8>>, GenerationError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
