use completion_provider::{
    CompletionError, CompletionProvider, CompletionRequest, ProviderProfile,
};

use crate::client::GeminiApiClient;
use crate::config::GeminiApiConfig;
use crate::error::GeminiApiError;
use crate::payload::GenerateContentRequest;

pub const GEMINI_API_PROVIDER_ID: &str = "gemini-api";

/// [`CompletionProvider`] adapter over the blocking Gemini client.
pub struct GeminiProvider {
    client: GeminiApiClient,
    model: String,
}

impl GeminiProvider {
    pub fn new(config: GeminiApiConfig) -> Result<Self, GeminiApiError> {
        let model = config.model.clone();
        let client = GeminiApiClient::new(config)?;
        Ok(Self { client, model })
    }
}

impl CompletionProvider for GeminiProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: GEMINI_API_PROVIDER_ID.to_string(),
            model_id: self.model.clone(),
        }
    }

    fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let payload = GenerateContentRequest::from_completion(&request);
        self.client
            .generate(&payload)
            .map_err(GeminiApiError::into_completion_error)
    }
}
