//! Minimal provider-agnostic contract for producing one assistant completion.
//!
//! This crate intentionally defines only the shared conversation message
//! shape, the completion request/outcome contract, and the failure taxonomy.
//! It excludes transport details, persistence, and turn orchestration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier for one in-flight completion request.
pub type CompletionId = u64;

/// Upper bound on prior messages replayed to the completion service,
/// excluding the newest user message.
pub const PRIOR_TURN_WINDOW: usize = 10;

/// Conversation author of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One immutable transcript message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Constructs a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Constructs an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Reply-length preference carried into the system directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyLength {
    Compact,
    #[default]
    Default,
    Verbose,
}

impl ReplyLength {
    /// Returns the directive sentence handed to the completion service for
    /// this preference.
    #[must_use]
    pub fn directive(self) -> &'static str {
        match self {
            Self::Compact => "Keep the script short and focused with minimal boilerplate.",
            Self::Verbose => {
                "Provide a more comprehensive, larger script with helpful comments."
            }
            Self::Default => "Choose an appropriate script length based on the user request.",
        }
    }
}

/// Input required to start one completion.
///
/// `prior_turns` holds at most [`PRIOR_TURN_WINDOW`] messages and never
/// includes `user_text` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub completion_id: CompletionId,
    pub system_directive: String,
    pub prior_turns: Vec<Message>,
    pub user_text: String,
}

/// Failure taxonomy for a completion attempt.
///
/// Providers must map every transport- or service-level failure onto exactly
/// one of these variants; callers decide how each is surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("the completion service rejected the configured credential")]
    InvalidCredential,

    #[error("transport failure while contacting the completion service: {0}")]
    Transport(String),

    #[error("completion service failure: {0}")]
    Unknown(String),
}

/// Immutable metadata describing a completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
    pub model_id: String,
}

/// Provider interface for executing one completion request.
///
/// `complete` is synchronous; callers that need a non-blocking surface run it
/// on a dedicated worker thread. Once issued, a request runs to resolution or
/// failure; there is no cancellation.
pub trait CompletionProvider: Send + Sync + 'static {
    /// Returns provider/model identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Produces the assistant reply text for one request.
    fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::{
        CompletionError, CompletionProvider, CompletionRequest, Message, ProviderProfile,
        ReplyLength, Role, PRIOR_TURN_WINDOW,
    };

    struct MinimalProvider;

    impl CompletionProvider for MinimalProvider {
        fn profile(&self) -> ProviderProfile {
            ProviderProfile {
                provider_id: "minimal".to_string(),
                model_id: "minimal-model".to_string(),
            }
        }

        fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
            Ok(format!("echo: {}", request.user_text))
        }
    }

    #[test]
    fn message_constructors_set_role_and_content() {
        assert_eq!(
            Message::user("hi"),
            Message {
                role: Role::User,
                content: "hi".to_string(),
            }
        );
        assert_eq!(
            Message::assistant("hello"),
            Message {
                role: Role::Assistant,
                content: "hello".to_string(),
            }
        );
    }

    #[test]
    fn role_serializes_to_lowercase_wire_names() {
        let user = serde_json::to_value(Message::user("a")).expect("serialize user");
        let assistant =
            serde_json::to_value(Message::assistant("b")).expect("serialize assistant");

        assert_eq!(user["role"], "user");
        assert_eq!(assistant["role"], "assistant");
    }

    #[test]
    fn role_round_trips_through_wire_names() {
        let message: Message =
            serde_json::from_str(r#"{"role":"assistant","content":"ok"}"#).expect("deserialize");
        assert_eq!(message, Message::assistant("ok"));
    }

    #[test]
    fn reply_length_directives_are_distinct() {
        let directives = [
            ReplyLength::Compact.directive(),
            ReplyLength::Default.directive(),
            ReplyLength::Verbose.directive(),
        ];

        assert!(directives[0].contains("short"));
        assert!(directives[2].contains("comprehensive"));
        assert_ne!(directives[0], directives[1]);
        assert_ne!(directives[1], directives[2]);
    }

    #[test]
    fn reply_length_defaults_to_default() {
        assert_eq!(ReplyLength::default(), ReplyLength::Default);
    }

    #[test]
    fn completion_request_carries_window_and_newest_text() {
        let request = CompletionRequest {
            completion_id: 7,
            system_directive: "directive".to_string(),
            prior_turns: vec![Message::assistant("greeting")],
            user_text: "write a script".to_string(),
        };

        assert_eq!(request.completion_id, 7);
        assert!(request.prior_turns.len() <= PRIOR_TURN_WINDOW);
        assert_eq!(request.user_text, "write a script");
    }

    #[test]
    fn completion_error_display_distinguishes_credential_failures() {
        assert!(CompletionError::InvalidCredential
            .to_string()
            .contains("credential"));
        assert!(CompletionError::Transport("timed out".to_string())
            .to_string()
            .contains("timed out"));
        assert!(CompletionError::Unknown("boom".to_string())
            .to_string()
            .contains("boom"));
    }

    #[test]
    fn minimal_provider_satisfies_contract() {
        let provider = MinimalProvider;
        assert_eq!(provider.profile().provider_id, "minimal");

        let reply = provider
            .complete(CompletionRequest {
                completion_id: 1,
                system_directive: String::new(),
                prior_turns: Vec::new(),
                user_text: "ping".to_string(),
            })
            .expect("minimal provider never fails");
        assert_eq!(reply, "echo: ping");
    }
}
