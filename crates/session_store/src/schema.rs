use completion_provider::{Message, Role};
use serde::{Deserialize, Serialize};

/// Capacity of the recent-chat collection.
pub const MAX_RECENT_CHATS: usize = 8;

/// Maximum number of characters carried into a derived session title.
pub const TITLE_MAX_CHARS: usize = 30;

/// Title used when a history carries no user message.
pub const TITLE_PLACEHOLDER: &str = "New Chat";

const TITLE_TRUNCATION_MARKER: &str = "...";

/// One persisted snapshot of a transcript plus recency metadata.
///
/// `id` is opaque but monotonically increasing under the single-writer model;
/// `last_updated` is epoch milliseconds and strictly increases across saves
/// touching the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: u64,
    pub title: String,
    pub history: Vec<Message>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: u64,
}

/// Bounded session collection maintained in touch order.
///
/// The most-recently-updated entry sits at the tail. Display order is a
/// separate projection ([`RecentChats::listing`]) and never alters touch
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentChats {
    sessions: Vec<Session>,
}

impl RecentChats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_sessions(sessions: Vec<Session>) -> Self {
        let mut chats = Self { sessions };
        chats.trim_to_capacity();
        chats
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Returns sessions in touch order, least-recently-touched first.
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Session> {
        self.sessions.iter().find(|session| session.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    /// Returns the session with the highest `last_updated`, if any.
    #[must_use]
    pub fn most_recent(&self) -> Option<&Session> {
        self.sessions
            .iter()
            .max_by_key(|session| session.last_updated)
    }

    /// Display projection sorted by `last_updated` descending.
    #[must_use]
    pub fn listing(&self) -> Vec<&Session> {
        let mut listing: Vec<&Session> = self.sessions.iter().collect();
        listing.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        listing
    }

    /// Replace-by-id with move-to-tail, else append; then trim to capacity.
    pub(crate) fn upsert(&mut self, session: Session) {
        if let Some(index) = self
            .sessions
            .iter()
            .position(|existing| existing.id == session.id)
        {
            self.sessions.remove(index);
        }

        self.sessions.push(session);
        self.trim_to_capacity();
    }

    fn trim_to_capacity(&mut self) {
        if self.sessions.len() > MAX_RECENT_CHATS {
            let excess = self.sessions.len() - MAX_RECENT_CHATS;
            self.sessions.drain(..excess);
        }
    }

    pub(crate) fn as_slice(&self) -> &[Session] {
        &self.sessions
    }
}

/// Persistence qualifying rule: more than one message and at least one user
/// turn. Guards against persisting an empty or assistant-only conversation.
#[must_use]
pub fn transcript_qualifies(history: &[Message]) -> bool {
    history.len() > 1 && history.iter().any(|message| message.role == Role::User)
}

/// Derives a session title from the first user message.
///
/// Truncation is char-boundary safe; histories without a user message get
/// [`TITLE_PLACEHOLDER`].
#[must_use]
pub fn generate_title(history: &[Message]) -> String {
    let Some(first_user) = history
        .iter()
        .find(|message| message.role == Role::User)
    else {
        return TITLE_PLACEHOLDER.to_string();
    };

    let char_count = first_user.content.chars().count();
    if char_count > TITLE_MAX_CHARS {
        let mut title: String = first_user.content.chars().take(TITLE_MAX_CHARS).collect();
        title.push_str(TITLE_TRUNCATION_MARKER);
        title
    } else {
        first_user.content.clone()
    }
}
