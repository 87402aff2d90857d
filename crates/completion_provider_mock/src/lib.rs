//! Deterministic mock implementation of the shared `completion_provider`
//! contract.
//!
//! This crate contains no transport logic and is intended for local
//! development and contract-level integration testing. Replies are consumed
//! from a caller-provided script in order; an exhausted script falls back to
//! a fixed showcase reply exercising prose emphasis and a fenced code block.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use completion_provider::{
    CompletionError, CompletionProvider, CompletionRequest, ProviderProfile,
};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

const DEFAULT_REPLY: &str = "Here is a **deterministic** mock reply with *inline emphasis*.\n\
```\nprint(\"hello from the mock provider\")\n```\n\
Let me know if you want anything adjusted.";

/// One scripted completion outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    Text(String),
    Fail(CompletionError),
}

impl ScriptedReply {
    /// Convenience constructor for a successful scripted reply.
    #[must_use]
    pub fn text(reply: impl Into<String>) -> Self {
        Self::Text(reply.into())
    }
}

/// Deterministic mock provider used by `gemchat` tests and local runs.
#[derive(Debug)]
pub struct MockProvider {
    script: Mutex<VecDeque<ScriptedReply>>,
    model_id: String,
}

impl MockProvider {
    /// Creates a mock provider that plays back `script` in order.
    #[must_use]
    pub fn new(script: Vec<ScriptedReply>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            model_id: "mock-model".to_string(),
        }
    }

    /// Creates a mock provider from plain reply texts.
    #[must_use]
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(ScriptedReply::text).collect())
    }

    /// Returns the number of scripted outcomes not yet consumed.
    pub fn remaining(&self) -> usize {
        lock_unpoisoned(&self.script).len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl CompletionProvider for MockProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: self.model_id.clone(),
        }
    }

    fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let _ = request;

        match lock_unpoisoned(&self.script).pop_front() {
            Some(ScriptedReply::Text(reply)) => Ok(reply),
            Some(ScriptedReply::Fail(error)) => Err(error),
            None => Ok(DEFAULT_REPLY.to_string()),
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
