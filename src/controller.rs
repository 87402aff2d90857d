//! Conversation state machine: transcript, turn-taking, session switching.
//!
//! `ChatController` is synchronous, single-owner state. Anything that blocks
//! lives behind the [`CompletionHost`] seam; completion outcomes come back
//! through the `on_completion_*` callbacks and pass a stale guard keyed to
//! the awaited completion id before touching the transcript.

use completion_provider::{
    CompletionError, CompletionId, Message, ReplyLength, PRIOR_TURN_WINDOW,
};
use session_store::{
    generate_title, transcript_qualifies, RecentChats, Session, SessionStore, SessionStoreError,
    StorageBackend,
};
use thiserror::Error;

pub const INITIAL_GREETING: &str =
    "Hello! I'm Gemini, your AI assistant from Google. How can I help you today?";
pub const INVALID_KEY_MESSAGE: &str =
    "Invalid API key. Please check your Gemini API key in settings.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";
pub const ERROR_COMPLETION_ACTIVE: &str = "Completion already active";

/// System directive sent with every completion request; never rendered.
pub fn system_directive(length: ReplyLength) -> String {
    format!(
        "You are Gemini, a helpful AI assistant from Google.\n\
         When generating code or scripts, follow this length preference: {}\n\
         Explain your thought process briefly before showing code.\n\
         Wrap all code in triple backticks (```), do not include language labels.\n\
         Use *italics* and **bold** for emphasis. Keep responses clear and friendly.",
        length.directive()
    )
}

/// Host seam for everything the controller must not block on.
pub trait CompletionHost {
    /// Starts one completion and returns its id. At most one completion may
    /// be outstanding; a second start fails with [`ERROR_COMPLETION_ACTIVE`].
    fn start_completion(
        &mut self,
        system_directive: String,
        prior_turns: Vec<Message>,
        user_text: String,
    ) -> Result<CompletionId, String>;
    fn request_render(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a reply is still pending")]
    ReplyInProgress,
}

pub struct ChatController<B: StorageBackend> {
    store: SessionStore<B>,
    chats: RecentChats,
    transcript: Vec<Message>,
    active_id: Option<u64>,
    awaiting: Option<CompletionId>,
    reply_length: ReplyLength,
    last_store_error: Option<SessionStoreError>,
}

impl<B: StorageBackend> ChatController<B> {
    /// Loads the persisted collection and activates the most recently
    /// updated session, or seeds a greeting-only transcript when the store
    /// is empty. The greeting alone is never persisted.
    pub fn new(mut store: SessionStore<B>) -> Self {
        let chats = store.load();
        let mut controller = Self {
            store,
            chats,
            transcript: Vec::new(),
            active_id: None,
            awaiting: None,
            reply_length: ReplyLength::default(),
            last_store_error: None,
        };

        match controller.chats.most_recent().map(|session| session.id) {
            Some(id) => controller.activate(id),
            None => controller.reset_to_greeting(),
        }

        controller
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn active_session_id(&self) -> Option<u64> {
        self.active_id
    }

    pub fn awaiting_reply(&self) -> bool {
        self.awaiting.is_some()
    }

    pub fn reply_length(&self) -> ReplyLength {
        self.reply_length
    }

    pub fn set_reply_length(&mut self, length: ReplyLength) {
        self.reply_length = length;
    }

    /// Display projection of the session collection, most recent first.
    pub fn listing(&self) -> Vec<&Session> {
        self.chats.listing()
    }

    pub fn credential(&self) -> Option<String> {
        self.store.credential()
    }

    pub fn set_credential(&mut self, credential: &str) -> Result<(), SessionStoreError> {
        self.store.set_credential(credential)
    }

    pub fn clear_credential(&mut self) -> Result<(), SessionStoreError> {
        self.store.clear_credential()
    }

    /// Most recent persistence failure, if any. Write failures are non-fatal
    /// and the in-memory collection stays authoritative; this exists so a
    /// host can report them.
    pub fn take_store_error(&mut self) -> Option<SessionStoreError> {
        self.last_store_error.take()
    }

    /// Saves the current conversation if it qualifies, then resets to a
    /// fresh greeting-only transcript. Any outstanding completion is
    /// abandoned; its outcome will fail the stale guard.
    pub fn start_new_chat(&mut self, host: &mut dyn CompletionHost) {
        self.save_if_qualifying();
        self.reset_to_greeting();
        host.request_render();
    }

    /// Switches to a stored session: saves the current conversation if it
    /// qualifies, then replaces the transcript with the stored history
    /// verbatim. Loading the already-active session is a no-op; loading an
    /// id that is no longer in the collection falls back to a new chat.
    pub fn load_session(&mut self, host: &mut dyn CompletionHost, id: u64) {
        if self.active_id == Some(id) {
            return;
        }

        self.save_if_qualifying();
        if self.chats.contains(id) {
            self.activate(id);
        } else {
            self.reset_to_greeting();
        }
        host.request_render();
    }

    /// Appends a user turn and starts a completion for it.
    ///
    /// Rejected without touching the transcript while a reply is awaited;
    /// resending after a failure is the only retry mechanism. If the host
    /// cannot start the completion, the mapped failure message is appended
    /// and the persistence step runs immediately.
    pub fn record_turn(
        &mut self,
        host: &mut dyn CompletionHost,
        text: &str,
    ) -> Result<(), TurnError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TurnError::EmptyMessage);
        }
        if self.awaiting.is_some() {
            return Err(TurnError::ReplyInProgress);
        }

        self.transcript.push(Message::user(trimmed));
        let prior_turns = self.prior_turn_window();

        match host.start_completion(
            system_directive(self.reply_length),
            prior_turns,
            trimmed.to_string(),
        ) {
            Ok(completion_id) => {
                self.awaiting = Some(completion_id);
            }
            Err(error) if error == ERROR_COMPLETION_ACTIVE => {
                self.transcript.pop();
                host.request_render();
                return Err(TurnError::ReplyInProgress);
            }
            Err(_) => {
                self.transcript.push(Message::assistant(GENERIC_FAILURE_MESSAGE));
                self.save_if_qualifying();
            }
        }

        host.request_render();
        Ok(())
    }

    /// Applies a finished completion. Outcomes whose id is not the awaited
    /// one are discarded without touching transcript or store.
    pub fn on_completion_finished(
        &mut self,
        host: &mut dyn CompletionHost,
        completion_id: CompletionId,
        reply: &str,
    ) {
        if self.awaiting != Some(completion_id) {
            return;
        }

        self.awaiting = None;
        self.transcript.push(Message::assistant(reply));
        self.save_if_qualifying();
        host.request_render();
    }

    /// Applies a failed completion under the same stale guard. The user's
    /// message is preserved and the conversation is still saved, so the
    /// failure is visible after a session switch.
    pub fn on_completion_failed(
        &mut self,
        host: &mut dyn CompletionHost,
        completion_id: CompletionId,
        error: &CompletionError,
    ) {
        if self.awaiting != Some(completion_id) {
            return;
        }

        self.awaiting = None;
        let message = match error {
            CompletionError::InvalidCredential => INVALID_KEY_MESSAGE,
            CompletionError::Transport(_) | CompletionError::Unknown(_) => {
                GENERIC_FAILURE_MESSAGE
            }
        };
        self.transcript.push(Message::assistant(message));
        self.save_if_qualifying();
        host.request_render();
    }

    /// The `PRIOR_TURN_WINDOW` most recent messages excluding the newest
    /// user message, which travels separately in the request.
    fn prior_turn_window(&self) -> Vec<Message> {
        let prior = &self.transcript[..self.transcript.len() - 1];
        let start = prior.len().saturating_sub(PRIOR_TURN_WINDOW);
        prior[start..].to_vec()
    }

    fn save_if_qualifying(&mut self) {
        if !transcript_qualifies(&self.transcript) {
            return;
        }

        let id = self
            .active_id
            .filter(|id| self.chats.contains(*id))
            .unwrap_or_else(|| self.store.next_touch());
        let session = Session {
            id,
            title: generate_title(&self.transcript),
            history: self.transcript.clone(),
            last_updated: self.store.next_touch(),
        };

        self.active_id = Some(id);
        if let Err(error) = self.store.upsert(&mut self.chats, session) {
            self.last_store_error = Some(error);
        }
    }

    fn activate(&mut self, id: u64) {
        if let Some(session) = self.chats.get(id) {
            self.transcript = session.history.clone();
            self.active_id = Some(id);
            self.awaiting = None;
        }
    }

    fn reset_to_greeting(&mut self) {
        self.transcript = vec![Message::assistant(INITIAL_GREETING)];
        self.active_id = None;
        self.awaiting = None;
    }
}
