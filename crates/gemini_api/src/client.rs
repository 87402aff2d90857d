use reqwest::blocking::Client;

use crate::config::GeminiApiConfig;
use crate::error::GeminiApiError;
use crate::payload::{GenerateContentRequest, GenerateContentResponse};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Blocking HTTP client for the `generateContent` endpoint.
pub struct GeminiApiClient {
    config: GeminiApiConfig,
    http: Client,
}

impl GeminiApiClient {
    pub fn new(config: GeminiApiConfig) -> Result<Self, GeminiApiError> {
        if config.api_key.trim().is_empty() {
            return Err(GeminiApiError::MissingApiKey);
        }
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiApiConfig {
        &self.config
    }

    /// Sends one generation request and returns the reply text of the first
    /// candidate.
    pub fn generate(&self, payload: &GenerateContentRequest) -> Result<String, GeminiApiError> {
        let response = self
            .http
            .post(self.config.generate_content_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(payload)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(GeminiApiError::from_response(status, &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        parsed.reply_text().ok_or(GeminiApiError::EmptyResponse)
    }
}
