//! Gemini API client.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use comanda_core::{ExtractedMenu, digits_only};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::GeminiConfig;

use super::error::{ApiErrorResponse, GeminiError};
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part, menu_schema,
};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const EXTRACTION_PROMPT: &str = "\
Analyze the attached restaurant menu image.
Extract the restaurant name, the meal title (e.g. \"Almoço de Hoje\"), the list of food items, the price, and the phone number.

If the currency is in R$ (BRL), format the price as a number.
Clean the phone number to be digits only.
Return the data in strict JSON format.";

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    client: reqwest::Client,
    model: String,
    endpoint: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.inner.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::Unauthorized` if the API key is not a valid
    /// header value, or `GeminiError::Http` if the client cannot be built.
    pub fn new(config: &GeminiConfig) -> Result<Self, GeminiError> {
        Self::with_base_url(config, GEMINI_API_URL)
    }

    /// Create a client against a different API root.
    ///
    /// # Errors
    ///
    /// Same as [`GeminiClient::new`].
    pub fn with_base_url(config: &GeminiConfig, base_url: &str) -> Result<Self, GeminiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|_| GeminiError::Unauthorized("API key is not a valid header value".into()))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                endpoint: format!(
                    "{}/models/{}:generateContent",
                    base_url.trim_end_matches('/'),
                    config.model
                ),
                model: config.model.clone(),
            }),
        })
    }

    /// Model this client talks to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Extract menu fields from a photo.
    ///
    /// The phone number, when present, is reduced to digits.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API reports an error, the
    /// model returns no text, or the text is not a valid menu.
    #[instrument(skip(self, image), fields(model = %self.inner.model, bytes = image.len()))]
    pub async fn extract_menu(&self, image: &[u8]) -> Result<ExtractedMenu, GeminiError> {
        let request = build_request(image);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_status(status, response).await);
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| GeminiError::Parse(format!("Failed to parse response: {e}")))?;

        let menu = parse_menu(&parsed)?;
        tracing::info!(items = menu.items.len(), "Menu extracted");
        Ok(menu)
    }

    /// Handle an error status code.
    async fn handle_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> GeminiError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return GeminiError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return GeminiError::Unauthorized("Invalid API key".to_string());
        }

        match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => GeminiError::Api {
                    status: api_error.error.status,
                    message: api_error.error.message,
                },
                Err(_) => GeminiError::Api {
                    status: status.to_string(),
                    message: body,
                },
            },
            Err(e) => GeminiError::Http(e),
        }
    }
}

fn build_request(image: &[u8]) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_owned()),
            parts: vec![
                Part::inline(sniff_mime_type(image), STANDARD.encode(image)),
                Part::text(EXTRACTION_PROMPT),
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_owned(),
            response_schema: menu_schema(),
        },
    }
}

fn parse_menu(response: &GenerateContentResponse) -> Result<ExtractedMenu, GeminiError> {
    let text = response.text().ok_or(GeminiError::EmptyResponse)?;
    let mut menu: ExtractedMenu = serde_json::from_str(text.trim())
        .map_err(|e| GeminiError::Parse(format!("Model returned invalid menu JSON: {e}")))?;
    menu.phone = menu.phone.as_deref().map(digits_only);
    Ok(menu)
}

/// Guess an image MIME type from its magic bytes. Defaults to JPEG.
#[must_use]
pub fn sniff_mime_type(image: &[u8]) -> &'static str {
    if image.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if image.starts_with(b"GIF87a") || image.starts_with(b"GIF89a") {
        "image/gif"
    } else if image.len() >= 12 && &image[..4] == b"RIFF" && &image[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}
