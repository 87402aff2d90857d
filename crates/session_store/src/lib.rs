//! Bounded, persisted collection of recent chat sessions.
//!
//! Persistence goes through the [`StorageBackend`] abstraction so hosts can
//! substitute any key-value facility (a directory of files in production, an
//! in-memory map in tests). The collection is capped at
//! [`MAX_RECENT_CHATS`] entries kept in touch order; the least-recently
//! touched entry is evicted first. Load never fails: corrupt or malformed
//! stored data degrades to an empty collection, and write failures leave the
//! in-memory collection authoritative for the running process.

mod clock;
mod error;
mod schema;
mod storage;
mod store;

pub use clock::TouchClock;
pub use error::SessionStoreError;
pub use schema::{
    generate_title, transcript_qualifies, RecentChats, Session, MAX_RECENT_CHATS,
    TITLE_MAX_CHARS, TITLE_PLACEHOLDER,
};
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use store::{SessionStore, CREDENTIAL_KEY, SESSIONS_KEY};
