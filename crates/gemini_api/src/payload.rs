use completion_provider::{CompletionRequest, Role};
use serde::{Deserialize, Serialize};

/// Canonical request payload shape for the `generateContent` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

impl Part {
    pub fn text(value: impl Into<String>) -> Self {
        Self { text: value.into() }
    }
}

/// Gemini expects `model` for assistant turns on the wire.
fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

impl GenerateContentRequest {
    /// Builds the wire payload for one completion request: the system
    /// directive, the prior-turn window in order, then the new user text as
    /// the final content entry.
    pub fn from_completion(request: &CompletionRequest) -> Self {
        let mut contents: Vec<Content> = request
            .prior_turns
            .iter()
            .map(|message| Content {
                role: wire_role(message.role).to_string(),
                parts: vec![Part::text(message.content.clone())],
            })
            .collect();
        contents.push(Content {
            role: wire_role(Role::User).to_string(),
            parts: vec![Part::text(request.user_text.clone())],
        });

        Self {
            system_instruction: Some(SystemInstruction {
                parts: vec![Part::text(request.system_directive.clone())],
            }),
            contents,
        }
    }
}

/// Response payload for `generateContent`; only the fields the client reads.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl GenerateContentResponse {
    /// Reply text of the first candidate, with multi-part candidates joined
    /// in order. `None` when the response carries no text at all.
    pub fn reply_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        if content.parts.is_empty() {
            return None;
        }
        Some(
            content
                .parts
                .iter()
                .map(|part| part.text.as_str())
                .collect::<String>(),
        )
    }
}
