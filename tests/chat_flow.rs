use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use completion_provider::{
    CompletionError, CompletionProvider, CompletionRequest, ProviderProfile,
};
use completion_provider_mock::{MockProvider, ScriptedReply};
use gemchat::controller::{
    ChatController, GENERIC_FAILURE_MESSAGE, INITIAL_GREETING, INVALID_KEY_MESSAGE,
};
use gemchat::runtime::CompletionRuntime;
use reply_markup::{parse_reply, Segment, Span};
use session_store::{FileStorage, MemoryStorage, SessionStore, StorageBackend};

fn runtime_with(
    provider: Arc<dyn CompletionProvider>,
) -> Arc<CompletionRuntime<MemoryStorage>> {
    let controller = ChatController::new(SessionStore::new(MemoryStorage::new()));
    CompletionRuntime::new(controller, provider)
}

/// Flushes queued completion events until `done` holds or a deadline passes.
fn flush_until<B, F>(runtime: &Arc<CompletionRuntime<B>>, mut done: F)
where
    B: StorageBackend,
    F: FnMut(&ChatController<B>) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        runtime.flush_pending_events();
        {
            let controller = runtime.lock_controller();
            if done(&controller) {
                return;
            }
        }
        assert!(
            Instant::now() < deadline,
            "completion outcome was not applied in time"
        );
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn scripted_conversation_round_trip() {
    let provider = Arc::new(MockProvider::new(vec![
        ScriptedReply::text("**Sure.** Here you go."),
        ScriptedReply::Fail(CompletionError::InvalidCredential),
    ]));
    let runtime = runtime_with(provider);

    runtime.record_turn("write me a haiku").unwrap();
    flush_until(&runtime, |controller| !controller.awaiting_reply());

    {
        let controller = runtime.lock_controller();
        let contents: Vec<&str> = controller
            .transcript()
            .iter()
            .map(|message| message.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec![INITIAL_GREETING, "write me a haiku", "**Sure.** Here you go."]
        );
        assert_eq!(controller.listing().len(), 1);
        assert_eq!(controller.listing()[0].title, "write me a haiku");
    }

    runtime.record_turn("and another").unwrap();
    flush_until(&runtime, |controller| !controller.awaiting_reply());

    let controller = runtime.lock_controller();
    // The failed turn keeps the user message and appends the key guidance.
    let transcript = controller.transcript();
    assert_eq!(transcript[3].content, "and another");
    assert_eq!(transcript[4].content, INVALID_KEY_MESSAGE);
    // Still one session, updated in place.
    assert_eq!(controller.listing().len(), 1);
}

#[test]
fn conversation_survives_a_rebuild_over_the_same_store() {
    let dir = tempfile::tempdir().unwrap();

    {
        let controller =
            ChatController::new(SessionStore::new(FileStorage::new(dir.path())));
        let runtime = CompletionRuntime::new(
            controller,
            Arc::new(MockProvider::with_replies(["it will persist"])),
        );
        runtime.record_turn("remember this").unwrap();
        flush_until(&runtime, |controller| !controller.awaiting_reply());
    }

    let rebuilt = ChatController::new(SessionStore::new(FileStorage::new(dir.path())));
    let contents: Vec<&str> = rebuilt
        .transcript()
        .iter()
        .map(|message| message.content.as_str())
        .collect();
    assert_eq!(
        contents,
        vec![INITIAL_GREETING, "remember this", "it will persist"]
    );
    assert_eq!(rebuilt.listing().len(), 1);
}

#[test]
fn default_mock_reply_decomposes_into_prose_and_code() {
    let runtime = runtime_with(Arc::new(MockProvider::default()));

    runtime.record_turn("show me something").unwrap();
    flush_until(&runtime, |controller| !controller.awaiting_reply());

    let controller = runtime.lock_controller();
    let reply = &controller.transcript().last().unwrap().content;
    let segments = parse_reply(reply);

    assert!(segments
        .iter()
        .any(|segment| matches!(segment, Segment::Code(_))));
    assert!(segments.iter().any(|segment| matches!(
        segment,
        Segment::Prose(spans) if spans.iter().any(|span| matches!(span, Span::Bold(_)))
    )));
}

struct PanickyProvider;

impl CompletionProvider for PanickyProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: "panicky".to_string(),
            model_id: "panicky".to_string(),
        }
    }

    fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
        panic!("provider blew up");
    }
}

#[test]
fn provider_panic_degrades_to_the_generic_guidance_message() {
    let runtime = runtime_with(Arc::new(PanickyProvider));

    runtime.record_turn("trigger the panic").unwrap();
    flush_until(&runtime, |controller| !controller.awaiting_reply());

    let controller = runtime.lock_controller();
    let transcript = controller.transcript();
    assert_eq!(transcript[1].content, "trigger the panic");
    assert_eq!(transcript[2].content, GENERIC_FAILURE_MESSAGE);
    // The failed conversation is still saved.
    assert_eq!(controller.listing().len(), 1);
}

#[test]
fn new_chat_during_flight_discards_the_late_reply() {
    let runtime = runtime_with(Arc::new(MockProvider::with_replies(["late reply"])));

    runtime.record_turn("abandon me").unwrap();
    runtime.start_new_chat();

    // Let the worker resolve, then apply whatever it queued.
    thread::sleep(Duration::from_millis(50));
    runtime.flush_pending_events();

    let controller = runtime.lock_controller();
    assert_eq!(controller.transcript().len(), 1);
    assert_eq!(controller.transcript()[0].content, INITIAL_GREETING);
    // The abandoned conversation was saved on the way out, without the
    // late reply.
    assert_eq!(controller.listing().len(), 1);
    assert_eq!(controller.listing()[0].history.len(), 2);
}
