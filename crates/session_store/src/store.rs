use serde_json::Value;

use crate::clock::TouchClock;
use crate::error::SessionStoreError;
use crate::schema::{transcript_qualifies, RecentChats, Session};
use crate::storage::StorageBackend;

/// Record key for the bounded session collection.
pub const SESSIONS_KEY: &str = "recent_chats";

/// Record key for the opaque credential pass-through.
pub const CREDENTIAL_KEY: &str = "api_key";

/// Persistence gateway for [`RecentChats`] and the credential record.
///
/// The store is the single writer: callers own one `RecentChats` value,
/// mutate it exclusively through [`SessionStore::upsert`], and treat the
/// in-memory value as authoritative whenever a write fails.
#[derive(Debug)]
pub struct SessionStore<B: StorageBackend> {
    backend: B,
    clock: TouchClock,
}

impl<B: StorageBackend> SessionStore<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            clock: TouchClock::new(),
        }
    }

    /// Reads the persisted collection. Never fails: a missing record, an
    /// uninterpretable document, or individually malformed entries all
    /// degrade to whatever subset could be validated (possibly empty).
    ///
    /// Stored ids and stamps are fed to the touch clock so fresh stamps
    /// stay strictly ahead of everything already persisted.
    pub fn load(&mut self) -> RecentChats {
        let raw = match self.backend.get(SESSIONS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) | Err(_) => return RecentChats::new(),
        };

        let entries: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(_) => return RecentChats::new(),
        };

        let mut sessions: Vec<Session> = Vec::with_capacity(entries.len());
        for entry in entries {
            let Ok(session) = serde_json::from_value::<Session>(entry) else {
                continue;
            };

            // Only qualifying transcripts are ever persisted, so a stored
            // history that does not qualify is corrupt data in a valid shape.
            if !transcript_qualifies(&session.history) {
                continue;
            }

            // Duplicate ids cannot occur under the single-writer model, but
            // stored data is untrusted: keep the later entry.
            sessions.retain(|existing| existing.id != session.id);
            sessions.push(session);
        }

        for session in &sessions {
            self.clock.observe(session.id);
            self.clock.observe(session.last_updated);
        }

        RecentChats::from_sessions(sessions)
    }

    /// Applies the upsert to the in-memory collection, then persists the
    /// whole collection as one atomic write.
    ///
    /// The in-memory mutation always happens first; a returned error means
    /// only that the write did not complete, and is non-fatal.
    pub fn upsert(
        &mut self,
        chats: &mut RecentChats,
        session: Session,
    ) -> Result<(), SessionStoreError> {
        chats.upsert(session);
        self.persist(chats)
    }

    /// Returns the next strictly increasing touch stamp, used for both fresh
    /// session ids and `last_updated` values.
    pub fn next_touch(&mut self) -> u64 {
        self.clock.next()
    }

    /// Returns the stored credential verbatim, if any. Read failures are
    /// indistinguishable from an absent credential.
    pub fn credential(&self) -> Option<String> {
        self.backend.get(CREDENTIAL_KEY).ok().flatten()
    }

    /// Stores the credential verbatim.
    pub fn set_credential(&mut self, credential: &str) -> Result<(), SessionStoreError> {
        self.backend.set(CREDENTIAL_KEY, credential)
    }

    /// Removes the credential record (explicit logout).
    pub fn clear_credential(&mut self) -> Result<(), SessionStoreError> {
        self.backend.clear(CREDENTIAL_KEY)
    }

    fn persist(&mut self, chats: &RecentChats) -> Result<(), SessionStoreError> {
        let document = serde_json::to_string(chats.as_slice())
            .map_err(|source| SessionStoreError::serialize(SESSIONS_KEY, source))?;
        self.backend.set(SESSIONS_KEY, &document)
    }
}
