use completion_provider::CompletionError;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeminiApiError {
    #[error("API key is required")]
    MissingApiKey,
    #[error("API key was rejected: {0}")]
    CredentialRejected(String),
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status} {message}")]
    Status { status: StatusCode, message: String },
    #[error("response carried no reply text")]
    EmptyResponse,
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl GeminiApiError {
    /// Classifies a non-success response, separating rejected credentials
    /// from every other failure.
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let message = parse_error_message(status, body);
        if is_credential_rejection(status, body) {
            Self::CredentialRejected(message)
        } else {
            Self::Status { status, message }
        }
    }

    /// Collapses a transport failure into the provider-level error taxonomy.
    pub fn into_completion_error(self) -> CompletionError {
        match self {
            Self::MissingApiKey | Self::CredentialRejected(_) => {
                CompletionError::InvalidCredential
            }
            Self::Request(error) => CompletionError::Transport(error.to_string()),
            Self::Status { message, .. } => CompletionError::Transport(message),
            other => CompletionError::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayloadFields {
    message: Option<String>,
    status: Option<String>,
}

/// Human-readable message for a non-success response body.
pub(crate) fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(ErrorPayload { error: Some(fields) }) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(message) = fields.message.filter(|value| !value.is_empty()) {
            return message;
        }
    }
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

/// Whether a failed response indicates a rejected API key rather than a
/// transient fault. Gemini reports key problems as HTTP 400 with an
/// `API_KEY_INVALID` detail, but 401/403 and `UNAUTHENTICATED` are treated
/// the same way.
pub(crate) fn is_credential_rejection(status: StatusCode, body: &str) -> bool {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => true,
        StatusCode::BAD_REQUEST => {
            body.contains("API_KEY_INVALID") || body.contains("UNAUTHENTICATED")
        }
        _ => body.contains("API_KEY_INVALID"),
    }
}
