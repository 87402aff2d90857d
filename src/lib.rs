//! Assistant-chat client core: session lifecycle, turn orchestration, and
//! reply decomposition.
//!
//! ## Provider bootstrap
//!
//! `gemchat` requires explicit provider selection:
//!
//! - `GEMCHAT_PROVIDER=mock` for deterministic local tests
//! - `GEMCHAT_PROVIDER=gemini-api` for the Gemini `generateContent` transport
//!
//! The Gemini provider reads its API key from the session store's credential
//! record (key `api_key`); see [`providers::provider_from_env`].
//!
//! ## Structure
//!
//! - [`controller`] owns conversation state: the transcript, the active
//!   session, turn-taking backpressure, and the stale-reply guard. It never
//!   blocks; provider work goes through the [`controller::CompletionHost`]
//!   seam.
//! - [`runtime`] bridges the controller to provider worker threads, one per
//!   request, with queued completion events applied on the host's schedule.
//! - Session persistence lives in the `session_store` crate, the provider
//!   contract in `completion_provider`, reply decomposition in
//!   `reply_markup`, and the HTTP transport in `gemini_api`.
//!
//! Conversation memory contract: `gemchat` replays at most the ten most
//! recent prior messages with each completion request; older context is
//! dropped, not summarized.

pub mod controller;
pub mod providers;
pub mod runtime;

pub use controller::{
    system_directive, ChatController, CompletionHost, TurnError, ERROR_COMPLETION_ACTIVE,
    GENERIC_FAILURE_MESSAGE, INITIAL_GREETING, INVALID_KEY_MESSAGE,
};
pub use runtime::{CompletionEvent, CompletionRuntime, Waker};

pub use completion_provider::{
    CompletionError, CompletionId, CompletionProvider, Message, ReplyLength, Role,
};
pub use reply_markup::{parse_reply, Segment, Span};
pub use session_store::{FileStorage, MemoryStorage, SessionStore, StorageBackend};
