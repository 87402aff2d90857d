//! Provider selection for the chat runtime.

use std::sync::Arc;

use completion_provider::CompletionProvider;
use completion_provider_mock::{MockProvider, MOCK_PROVIDER_ID};
use gemini_api::{GeminiApiConfig, GeminiProvider, GEMINI_API_PROVIDER_ID};

pub const DEFAULT_PROVIDER_ID: &str = MOCK_PROVIDER_ID;
pub const PROVIDER_ENV_VAR: &str = "GEMCHAT_PROVIDER";

/// Resolves the provider named by `GEMCHAT_PROVIDER`, defaulting to the
/// deterministic mock. The Gemini provider needs the stored API key.
pub fn provider_from_env(api_key: Option<&str>) -> Result<Arc<dyn CompletionProvider>, String> {
    let provider_id = std::env::var(PROVIDER_ENV_VAR)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    provider_for_id(provider_id.as_deref().unwrap_or(DEFAULT_PROVIDER_ID), api_key)
}

pub fn provider_for_id(
    provider_id: &str,
    api_key: Option<&str>,
) -> Result<Arc<dyn CompletionProvider>, String> {
    match provider_id {
        MOCK_PROVIDER_ID => Ok(Arc::new(MockProvider::default())),
        GEMINI_API_PROVIDER_ID => {
            let api_key = api_key
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    format!("Provider '{GEMINI_API_PROVIDER_ID}' requires a stored API key")
                })?;
            let provider = GeminiProvider::new(GeminiApiConfig::new(api_key))
                .map_err(|error| error.to_string())?;
            Ok(Arc::new(provider))
        }
        unknown => Err(format!(
            "Unsupported provider '{unknown}'. Available providers: {MOCK_PROVIDER_ID}, {GEMINI_API_PROVIDER_ID}"
        )),
    }
}
