//! Generate — external image generation and its asynchronous bridge.
//!
//! DESIGN
//! ======
//! The generation capability is an [`ImageGenerator`] trait object so the
//! session never depends on a provider. [`ImageClient`] dispatches to Google
//! Imagen or an `OpenAI`-compatible endpoint, selected by `IMAGE_PROVIDER`.
//!
//! Requests run on the tokio runtime through [`GenerationBridge`]. Results
//! come back as [`Completion`] messages carrying the [`RequestToken`] that was
//! issued at dispatch, so stale or superseded results are dropped instead of
//! being applied to the document.

pub mod bridge;
pub mod config;
pub mod imagen;
pub mod openai;
pub mod types;

pub use bridge::{Completion, GenerationBridge, GenerationRequest, GenerationTarget, RequestToken};
use config::{ImageConfig, ImageProviderKind};
pub use types::{AspectRatio, GenerateOptions, GenerationError, ImageGenerator};

// =============================================================================
// CLIENT DISPATCH
// =============================================================================

/// Concrete image client that dispatches to Imagen or `OpenAI`.
///
/// Configured from environment variables by [`ImageClient::from_env`].
pub struct ImageClient {
    inner: ImageProvider,
    model: String,
}

enum ImageProvider {
    Imagen(imagen::ImagenClient),
    OpenAi(openai::OpenAiImageClient),
}

impl ImageClient {
    /// Build an image client from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, GenerationError> {
        let config = ImageConfig::from_env()?;
        Self::from_config(config)
    }

    /// Build an image client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client fails to build.
    pub fn from_config(config: ImageConfig) -> Result<Self, GenerationError> {
        let model = config.model.clone();
        let inner = match config.provider {
            ImageProviderKind::Imagen => {
                ImageProvider::Imagen(imagen::ImagenClient::new(config.api_key, config.base_url, config.timeouts)?)
            }
            ImageProviderKind::OpenAi => ImageProvider::OpenAi(openai::OpenAiImageClient::new(
                config.api_key,
                config.base_url,
                config.timeouts,
            )?),
        };
        Ok(Self { inner, model })
    }

    /// Return the configured model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl ImageGenerator for ImageClient {
    async fn generate_images(&self, prompt: &str, options: &GenerateOptions) -> Result<Vec<Vec<u8>>, GenerationError> {
        match &self.inner {
            ImageProvider::Imagen(c) => c.generate(&self.model, prompt, options).await,
            ImageProvider::OpenAi(c) => c.generate(&self.model, prompt, options).await,
        }
    }
}
