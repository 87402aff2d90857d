use completion_provider::{CompletionError, CompletionId, Message};
use gemchat::controller::{ChatController, CompletionHost, INITIAL_GREETING};
use session_store::{MemoryStorage, SessionStore};

struct HostStub {
    next_completion_id: CompletionId,
}

impl HostStub {
    fn new(next_completion_id: CompletionId) -> Self {
        Self { next_completion_id }
    }
}

impl CompletionHost for HostStub {
    fn start_completion(
        &mut self,
        _system_directive: String,
        _prior_turns: Vec<Message>,
        _user_text: String,
    ) -> Result<CompletionId, String> {
        Ok(self.next_completion_id)
    }

    fn request_render(&mut self) {}
}

fn controller() -> ChatController<MemoryStorage> {
    ChatController::new(SessionStore::new(MemoryStorage::new()))
}

#[test]
fn stale_reply_callbacks_are_ignored_while_a_different_reply_is_awaited() {
    let stale_completion = 10;
    let active_completion = 20;

    let mut controller = controller();
    let mut host = HostStub::new(active_completion);
    controller
        .record_turn(&mut host, "active question")
        .unwrap();

    let snapshot: Vec<Message> = controller.transcript().to_vec();

    controller.on_completion_finished(&mut host, stale_completion, "stale reply");
    controller.on_completion_failed(
        &mut host,
        stale_completion,
        &CompletionError::Transport("stale error".to_string()),
    );

    assert!(controller.awaiting_reply());
    assert_eq!(controller.transcript(), snapshot.as_slice());
    assert!(controller.listing().is_empty());

    controller.on_completion_finished(&mut host, active_completion, "live reply");
    assert!(!controller.awaiting_reply());
    assert_eq!(controller.transcript().last().unwrap().content, "live reply");
}

#[test]
fn reply_resolving_after_new_chat_is_discarded() {
    let abandoned_completion = 7;

    let mut controller = controller();
    let mut host = HostStub::new(abandoned_completion);
    controller.record_turn(&mut host, "slow question").unwrap();

    controller.start_new_chat(&mut host);
    let saved_before = controller.listing().len();

    controller.on_completion_finished(&mut host, abandoned_completion, "too late");

    assert_eq!(controller.transcript().len(), 1);
    assert_eq!(controller.transcript()[0].content, INITIAL_GREETING);
    assert_eq!(controller.listing().len(), saved_before);
}

#[test]
fn reply_resolving_after_session_switch_is_discarded() {
    let mut controller = controller();
    let mut host = HostStub::new(1);
    controller.record_turn(&mut host, "stored question").unwrap();
    controller.on_completion_finished(&mut host, 1, "stored reply");
    let stored_id = controller.active_session_id().unwrap();

    controller.start_new_chat(&mut host);
    host.next_completion_id = 2;
    controller.record_turn(&mut host, "question in flight").unwrap();

    // Switching back abandons the outstanding completion; the in-flight
    // conversation qualifies and is saved on the way out.
    controller.load_session(&mut host, stored_id);
    assert!(!controller.awaiting_reply());
    assert_eq!(controller.listing().len(), 2);

    let snapshot: Vec<Message> = controller.transcript().to_vec();
    controller.on_completion_finished(&mut host, 2, "answer for the abandoned chat");

    assert_eq!(controller.transcript(), snapshot.as_slice());
    assert_eq!(controller.listing().len(), 2);
    assert_eq!(
        controller.transcript().last().unwrap().content,
        "stored reply"
    );
}
