//! Transport-only Gemini API client primitives.
//!
//! This crate owns request building, response parsing, and error
//! classification for the Gemini `generateContent` endpoint. It contains no
//! conversation state and no UI coupling; the [`GeminiProvider`] adapter is
//! the only surface the chat runtime sees.

pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod provider;

pub use client::GeminiApiClient;
pub use config::{GeminiApiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::GeminiApiError;
pub use payload::{Content, GenerateContentRequest, GenerateContentResponse, Part};
pub use provider::{GeminiProvider, GEMINI_API_PROVIDER_ID};
