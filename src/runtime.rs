//! Bridges the synchronous controller to provider worker threads.
//!
//! One worker thread per completion request, at most one outstanding.
//! Workers never touch the controller directly: outcomes are queued as
//! [`CompletionEvent`]s and applied on the host's schedule, so transcript
//! mutation always happens under the controller lock on the host side.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use completion_provider::{
    CompletionError, CompletionId, CompletionProvider, CompletionRequest, Message,
};
use session_store::StorageBackend;

use crate::controller::{ChatController, CompletionHost, TurnError, ERROR_COMPLETION_ACTIVE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionEvent {
    Finished {
        completion_id: CompletionId,
        reply: String,
    },
    Failed {
        completion_id: CompletionId,
        error: CompletionError,
    },
}

impl CompletionEvent {
    fn completion_id(&self) -> CompletionId {
        match self {
            Self::Finished { completion_id, .. } | Self::Failed { completion_id, .. } => {
                *completion_id
            }
        }
    }
}

struct ActiveCompletion {
    completion_id: CompletionId,
    join_handle: Option<JoinHandle<()>>,
}

/// Callback invoked whenever the runtime has queued events or wants a
/// redraw. Hosts use it to schedule a [`CompletionRuntime::flush_pending_events`]
/// call on their own thread.
///
/// The runtime never invokes the waker while it holds the controller lock,
/// so the callback may synchronously call back into the runtime (including
/// [`CompletionRuntime::lock_controller`] and
/// [`CompletionRuntime::flush_pending_events`]). It may be invoked from
/// worker threads.
pub type Waker = Box<dyn Fn() + Send + Sync>;

pub struct CompletionRuntime<B: StorageBackend> {
    controller: Mutex<ChatController<B>>,
    pending_events: Mutex<VecDeque<CompletionEvent>>,
    next_completion_id: AtomicU64,
    active: Mutex<Option<ActiveCompletion>>,
    provider: Arc<dyn CompletionProvider>,
    waker: Option<Waker>,
    // Render requests raised while the controller lock is held; fired once
    // the guard drops.
    render_requested: AtomicBool,
}

impl<B: StorageBackend> CompletionRuntime<B> {
    pub fn new(controller: ChatController<B>, provider: Arc<dyn CompletionProvider>) -> Arc<Self> {
        Self::with_waker(controller, provider, None)
    }

    /// Creates a runtime that buffers completion events until the host
    /// flushes them.
    ///
    /// In event-driven hosts the waker schedules the flush. In headless or
    /// non-polling environments, call [`CompletionRuntime::flush_pending_events`]
    /// after the worker resolves to apply queued outcomes.
    pub fn with_waker(
        controller: ChatController<B>,
        provider: Arc<dyn CompletionProvider>,
        waker: Option<Waker>,
    ) -> Arc<Self> {
        Arc::new(Self {
            controller: Mutex::new(controller),
            pending_events: Mutex::new(VecDeque::new()),
            next_completion_id: AtomicU64::new(1),
            active: Mutex::new(None),
            provider,
            waker,
            render_requested: AtomicBool::new(false),
        })
    }

    pub fn lock_controller(&self) -> MutexGuard<'_, ChatController<B>> {
        lock_unpoisoned(&self.controller)
    }

    pub fn record_turn(self: &Arc<Self>, text: &str) -> Result<(), TurnError> {
        let mut host = Arc::clone(self);
        let result = {
            let mut controller = self.lock_controller();
            controller.record_turn(&mut host, text)
        };
        self.fire_deferred_render();
        result
    }

    pub fn start_new_chat(self: &Arc<Self>) {
        let mut host = Arc::clone(self);
        {
            let mut controller = self.lock_controller();
            controller.start_new_chat(&mut host);
        }
        self.fire_deferred_render();
    }

    pub fn load_session(self: &Arc<Self>, id: u64) {
        let mut host = Arc::clone(self);
        {
            let mut controller = self.lock_controller();
            controller.load_session(&mut host, id);
        }
        self.fire_deferred_render();
    }

    /// Applies queued completion events and returns how many were applied.
    pub fn flush_pending_events(self: &Arc<Self>) -> usize {
        let mut applied = 0usize;

        loop {
            let event = {
                let mut pending = lock_unpoisoned(&self.pending_events);
                pending.pop_front()
            };

            match event {
                Some(event) => {
                    self.apply_event(event);
                    applied += 1;
                }
                None => break,
            }
        }

        applied
    }

    fn start_completion_internal(
        self: &Arc<Self>,
        system_directive: String,
        prior_turns: Vec<Message>,
        user_text: String,
    ) -> Result<CompletionId, String> {
        let mut active = lock_unpoisoned(&self.active);
        if active.is_some() {
            return Err(ERROR_COMPLETION_ACTIVE.to_string());
        }

        let completion_id = self.next_completion_id.fetch_add(1, Ordering::SeqCst);
        let request = CompletionRequest {
            completion_id,
            system_directive,
            prior_turns,
            user_text,
        };
        let join_handle = self.spawn_worker(request)?;

        *active = Some(ActiveCompletion {
            completion_id,
            join_handle: Some(join_handle),
        });

        Ok(completion_id)
    }

    fn spawn_worker(
        self: &Arc<Self>,
        request: CompletionRequest,
    ) -> Result<JoinHandle<()>, String> {
        let completion_id = request.completion_id;
        let runtime = Arc::clone(self);
        thread::Builder::new()
            .name(format!("gemchat-completion-{completion_id}"))
            .spawn(move || runtime.completion_worker(request))
            .map_err(|error| format!("Failed to spawn completion worker: {error}"))
    }

    fn completion_worker(self: Arc<Self>, request: CompletionRequest) {
        let completion_id = request.completion_id;
        let provider = Arc::clone(&self.provider);

        let outcome = catch_unwind(AssertUnwindSafe(|| provider.complete(request)));

        let event = match outcome {
            Ok(Ok(reply)) => CompletionEvent::Finished {
                completion_id,
                reply,
            },
            Ok(Err(error)) => CompletionEvent::Failed {
                completion_id,
                error,
            },
            Err(_) => CompletionEvent::Failed {
                completion_id,
                error: CompletionError::Unknown("Completion provider panicked".to_string()),
            },
        };

        self.enqueue_event(event);
    }

    fn enqueue_event(self: &Arc<Self>, event: CompletionEvent) {
        {
            let mut pending = lock_unpoisoned(&self.pending_events);
            pending.push_back(event);
        }
        self.notify_waker();
    }

    fn apply_event(self: &Arc<Self>, event: CompletionEvent) {
        let completion_id = event.completion_id();
        let mut host = Arc::clone(self);

        {
            let mut controller = self.lock_controller();
            match event {
                CompletionEvent::Finished {
                    completion_id,
                    reply,
                } => controller.on_completion_finished(&mut host, completion_id, &reply),
                CompletionEvent::Failed {
                    completion_id,
                    error,
                } => controller.on_completion_failed(&mut host, completion_id, &error),
            }
        }

        self.fire_deferred_render();
        self.clear_active_if_matching(completion_id);
    }

    fn clear_active_if_matching(&self, completion_id: CompletionId) {
        let mut active = lock_unpoisoned(&self.active);
        let matches = active
            .as_ref()
            .map(|current| current.completion_id)
            == Some(completion_id);
        if !matches {
            return;
        }

        let mut completed = match active.take() {
            Some(completed) => completed,
            None => return,
        };

        if let Some(join_handle) = completed.join_handle.take() {
            let is_current_thread = join_handle.thread().id() == thread::current().id();
            if !is_current_thread && join_handle.is_finished() {
                let _ = join_handle.join();
            }
        }
    }

    fn notify_waker(&self) {
        if let Some(waker) = &self.waker {
            waker();
        }
    }

    fn fire_deferred_render(&self) {
        if self.render_requested.swap(false, Ordering::SeqCst) {
            self.notify_waker();
        }
    }
}

impl<B: StorageBackend> CompletionHost for Arc<CompletionRuntime<B>> {
    fn start_completion(
        &mut self,
        system_directive: String,
        prior_turns: Vec<Message>,
        user_text: String,
    ) -> Result<CompletionId, String> {
        self.start_completion_internal(system_directive, prior_turns, user_text)
    }

    fn request_render(&mut self) {
        // Raised under the controller lock; the runtime entry point that
        // holds the lock fires the waker after releasing it.
        self.render_requested.store(true, Ordering::SeqCst);
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
