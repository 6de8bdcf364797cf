//! Image-generation configuration parsed from environment variables.

use super::types::GenerationError;

pub const DEFAULT_IMAGEN_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_IMAGE_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageProviderKind {
    Imagen,
    OpenAi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for ImageTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_IMAGE_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_IMAGE_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    pub provider: ImageProviderKind,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeouts: ImageTimeouts,
}

impl ImageConfig {
    /// Build typed image-generation config from environment variables.
    ///
    /// Required:
    /// - `IMAGE_API_KEY_ENV` (names the env var containing the key)
    ///
    /// Optional:
    /// - `IMAGE_PROVIDER`: `imagen` (default) or `openai`
    /// - `IMAGE_MODEL`: provider default when absent
    /// - `IMAGE_BASE_URL`: provider default when absent
    /// - `IMAGE_REQUEST_TIMEOUT_SECS`: default 120
    /// - `IMAGE_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown provider or a missing API key.
    pub fn from_env() -> Result<Self, GenerationError> {
        let provider = parse_provider(env_opt("IMAGE_PROVIDER").as_deref())?;

        let key_var = std::env::var("IMAGE_API_KEY_ENV")
            .map_err(|_| GenerationError::MissingApiKey { var: "IMAGE_API_KEY_ENV".into() })?;
        let api_key = std::env::var(&key_var).map_err(|_| GenerationError::MissingApiKey { var: key_var.clone() })?;

        let model = env_opt("IMAGE_MODEL").unwrap_or_else(|| default_model(provider).to_string());
        let base_url = env_opt("IMAGE_BASE_URL")
            .unwrap_or_else(|| default_base_url(provider).to_string())
            .trim_end_matches('/')
            .to_string();
        let timeouts = ImageTimeouts {
            request_secs: env_parse_u64("IMAGE_REQUEST_TIMEOUT_SECS", DEFAULT_IMAGE_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("IMAGE_CONNECT_TIMEOUT_SECS", DEFAULT_IMAGE_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { provider, api_key, model, base_url, timeouts })
    }
}

fn env_opt(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    match env_opt(key).map(|v| v.trim().parse::<u64>()) {
        Some(Ok(value)) => value,
        _ => default,
    }
}

fn parse_provider(raw: Option<&str>) -> Result<ImageProviderKind, GenerationError> {
    match raw.unwrap_or("imagen") {
        "imagen" => Ok(ImageProviderKind::Imagen),
        "openai" => Ok(ImageProviderKind::OpenAi),
        other => Err(GenerationError::ConfigParse(format!("unknown IMAGE_PROVIDER: {other}"))),
    }
}

fn default_model(provider: ImageProviderKind) -> &'static str {
    match provider {
        ImageProviderKind::Imagen => "imagen-4.0-generate-001",
        ImageProviderKind::OpenAi => "gpt-image-1",
    }
}

fn default_base_url(provider: ImageProviderKind) -> &'static str {
    match provider {
        ImageProviderKind::Imagen => DEFAULT_IMAGEN_BASE_URL,
        ImageProviderKind::OpenAi => DEFAULT_OPENAI_BASE_URL,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
