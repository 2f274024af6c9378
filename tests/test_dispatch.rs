//! Tests for event classification, handlers, and the dispatch loop

mod common;

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use chat_relay::dispatch::replies;
use chat_relay::dispatch::{Command, Intent, classify, command_menu};
use chat_relay::{
    ActivityEvent, ActivityLog, AuthorizationGate, BotSettings, ChannelRef, ChatMessage,
    Dispatcher, InputKind, MemberStatus, ParseMode, Sender, Update, UserId,
};
use common::{
    MockCompletion, MockPlatform, Script, init_logging, text_message, update, voice_message,
};

#[derive(Default)]
struct RecordingActivity {
    events: Mutex<Vec<(UserId, ActivityEvent)>>,
}

impl ActivityLog for RecordingActivity {
    fn record(&self, user: &Sender, event: ActivityEvent) {
        self.events.lock().push((user.id, event));
    }
}

struct Harness {
    platform: Arc<MockPlatform>,
    completion: Arc<MockCompletion>,
    activity: Arc<RecordingActivity>,
    dispatcher: Dispatcher<MockPlatform, MockCompletion>,
}

fn harness(gate: AuthorizationGate) -> Harness {
    harness_with(MockPlatform::new(), gate)
}

fn harness_with(platform: MockPlatform, gate: AuthorizationGate) -> Harness {
    init_logging();
    let platform = Arc::new(platform);
    let completion = Arc::new(MockCompletion::new());
    let activity = Arc::new(RecordingActivity::default());

    let dispatcher = Dispatcher::builder(Arc::clone(&platform), Arc::clone(&completion))
        .settings(BotSettings::builder().model("test-model").build())
        .gate(gate)
        .activity(Arc::clone(&activity) as Arc<dyn ActivityLog>)
        .build();

    Harness {
        platform,
        completion,
        activity,
        dispatcher,
    }
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_classify_commands_and_messages() {
    let intent = |text: &str| classify(update(1, text_message(1, text))).map(|(i, _)| i);

    assert_eq!(intent("/start"), Some(Intent::Command(Command::Start)));
    assert_eq!(intent("/new@relay_bot"), Some(Intent::Command(Command::New)));
    assert_eq!(intent("/help please"), Some(Intent::Command(Command::Help)));
    assert_eq!(intent("/unknown"), None);
    assert_eq!(intent("what is rust?"), Some(Intent::Message));

    let voice = classify(update(2, voice_message(1, "file"))).map(|(i, _)| i);
    assert_eq!(voice, Some(Intent::Message));

    let empty = Update {
        update_id: 3,
        message: None,
    };
    assert!(classify(empty).is_none());
}

#[test]
fn test_command_menu_lists_handlers() {
    let names: Vec<String> = command_menu().into_iter().map(|c| c.command).collect();
    assert_eq!(names, ["start", "new", "help"]);
}

// ============================================================================
// Handlers
// ============================================================================

#[tokio::test]
async fn test_message_round_trip_builds_history() {
    let h = harness(AuthorizationGate::allow_all());
    h.completion.push(Script::tokens(&["Hello", "!"]));
    h.completion.push(Script::tokens(&["Again"]));
    let context = h.dispatcher.context();

    context
        .handle(Intent::Message, text_message(1, "hi"))
        .await
        .unwrap();
    context
        .handle(Intent::Message, text_message(1, "more"))
        .await
        .unwrap();

    let requests = h.completion.requests.lock().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].model, "test-model");
    assert!(requests[0].stream);
    assert_eq!(requests[0].messages, vec![ChatMessage::user("hi")]);
    assert_eq!(
        requests[1].messages,
        vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("Hello!"),
            ChatMessage::user("more"),
        ]
    );

    let session = context.sessions().get(UserId::new(1)).unwrap();
    assert_eq!(session.len(), 4);
    assert_eq!(h.platform.typing.load(Ordering::SeqCst), 2);
    assert_eq!(
        h.activity.events.lock().last().map(|(_, e)| *e),
        Some(ActivityEvent::MessageSent(InputKind::Text))
    );
}

#[tokio::test]
async fn test_new_clears_history() {
    let h = harness(AuthorizationGate::allow_all());
    h.completion.push(Script::tokens(&["answer"]));
    let context = h.dispatcher.context();

    context
        .handle(Intent::Message, text_message(1, "hi"))
        .await
        .unwrap();
    let session = context.sessions().get(UserId::new(1)).unwrap();
    assert_eq!(session.len(), 2);

    context
        .handle(Intent::Command(Command::New), text_message(1, "/new"))
        .await
        .unwrap();

    assert!(session.is_empty());
    let sends = h.platform.successful_sends();
    assert_eq!(sends.last().map(|s| s.text.as_str()), Some(replies::NEW_DIALOG));
}

#[tokio::test]
async fn test_start_and_help_replies() {
    let h = harness(AuthorizationGate::allow_all());
    let context = h.dispatcher.context();

    context
        .handle(Intent::Command(Command::Start), text_message(1, "/start"))
        .await
        .unwrap();
    context
        .handle(Intent::Command(Command::Help), text_message(1, "/help"))
        .await
        .unwrap();

    let sends = h.platform.successful_sends();
    assert_eq!(sends.len(), 2);
    assert!(sends[0].text.contains("test-model"));
    assert_eq!(sends[0].mode, ParseMode::Markdown);
    assert!(sends[1].text.contains("@useVityaEffect"));

    let events: Vec<_> = h.activity.events.lock().iter().map(|(_, e)| *e).collect();
    assert_eq!(events, [ActivityEvent::BotStart, ActivityEvent::HelpCommand]);
}

#[tokio::test]
async fn test_replies_fall_back_to_plain() {
    let h = harness(AuthorizationGate::allow_all());
    h.platform.reject_markdown.store(true, Ordering::SeqCst);

    h.dispatcher
        .context()
        .handle(Intent::Command(Command::Help), text_message(1, "/help"))
        .await
        .unwrap();

    let sends = h.platform.successful_sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].mode, ParseMode::Plain);
}

#[tokio::test]
async fn test_denied_user_gets_no_work() {
    let h = harness(AuthorizationGate::callback(|_, _| async { false }));
    let context = h.dispatcher.context();

    context
        .handle(Intent::Message, text_message(1, "hi"))
        .await
        .unwrap();
    context
        .handle(Intent::Command(Command::Start), text_message(1, "/start"))
        .await
        .unwrap();

    assert!(h.platform.sends.lock().is_empty());
    assert!(h.completion.requests.lock().is_empty());
    assert!(context.sessions().is_empty());
    assert!(h.activity.events.lock().is_empty());
}

#[tokio::test]
async fn test_channel_membership_gate() {
    let platform = Arc::new(MockPlatform::new());
    platform
        .members
        .lock()
        .insert(UserId::new(1), MemberStatus::Member);
    platform
        .members
        .lock()
        .insert(UserId::new(2), MemberStatus::Left);

    let gate = AuthorizationGate::channel_membership(
        Arc::clone(&platform),
        ChannelRef::parse("@news"),
        replies::subscribe_notice("@news"),
    );

    assert!(gate.is_authorized(UserId::new(1), 1.into()).await);
    assert!(platform.sends.lock().is_empty());

    assert!(!gate.is_authorized(UserId::new(2), 2.into()).await);
    assert!(!gate.is_authorized(UserId::new(3), 3.into()).await);

    let sends = platform.successful_sends();
    assert_eq!(sends.len(), 2);
    assert!(sends.iter().all(|s| s.text.contains("subscribe")));
}

#[tokio::test]
async fn test_voice_message_is_transcribed() {
    let h = harness(AuthorizationGate::allow_all());
    h.completion.push(Script::tokens(&["heard you"]));

    h.dispatcher
        .context()
        .handle(Intent::Message, voice_message(1, "voice-file"))
        .await
        .unwrap();

    let requests = h.completion.requests.lock().clone();
    assert_eq!(
        requests[0].messages,
        vec![ChatMessage::user("transcribed words")]
    );
    assert_eq!(
        h.activity.events.lock().last().map(|(_, e)| *e),
        Some(ActivityEvent::MessageSent(InputKind::Voice))
    );
}

#[tokio::test]
async fn test_voice_failure_replies_and_stops() {
    let h = harness(AuthorizationGate::allow_all());
    *h.completion.transcript.lock() = None;

    h.dispatcher
        .context()
        .handle(Intent::Message, voice_message(1, "voice-file"))
        .await
        .unwrap();

    let sends = h.platform.successful_sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].text, replies::VOICE_FAILED);
    assert!(h.completion.requests.lock().is_empty());
}

#[tokio::test]
async fn test_completion_failure_replies() {
    let h = harness(AuthorizationGate::allow_all());
    h.completion.fail_open.store(true, Ordering::SeqCst);

    h.dispatcher
        .context()
        .handle(Intent::Message, text_message(1, "hi"))
        .await
        .unwrap();

    let sends = h.platform.successful_sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].text, replies::COMPLETION_FAILED);
    assert!(h.platform.edits.lock().is_empty());
}

#[tokio::test]
async fn test_empty_generation_adds_no_assistant_turn() {
    let h = harness(AuthorizationGate::allow_all());
    h.completion.push(Script::default());
    let context = h.dispatcher.context();

    context
        .handle(Intent::Message, text_message(1, "hi"))
        .await
        .unwrap();

    let session = context.sessions().get(UserId::new(1)).unwrap();
    assert_eq!(session.history(), vec![ChatMessage::user("hi")]);
}

// ============================================================================
// Dispatch loop
// ============================================================================

#[tokio::test]
async fn test_dispatch_ignores_unhandled_updates() {
    let h = harness(AuthorizationGate::allow_all());
    assert!(h.dispatcher.dispatch(update(1, text_message(1, "/nope"))).is_none());

    let handle = h
        .dispatcher
        .dispatch(update(2, text_message(1, "/help")))
        .unwrap();
    tokio_test::assert_ok!(handle.await);
    assert_eq!(h.platform.successful_sends().len(), 1);
}

#[tokio::test]
async fn test_run_processes_feed_until_cancelled() {
    let (platform, feed) = MockPlatform::new().with_feed();
    let h = harness_with(platform, AuthorizationGate::allow_all());
    h.completion.push(Script::tokens(&["pong"]));

    let dispatcher = Arc::new(h.dispatcher);
    let cancel = CancellationToken::new();
    let running = {
        let dispatcher = Arc::clone(&dispatcher);
        let cancel = cancel.clone();
        tokio::spawn(async move { dispatcher.run(cancel).await })
    };

    feed.send(Ok(update(1, text_message(1, "ping")))).unwrap();
    feed.send(Err(chat_relay::RelayError::platform("Bad Gateway"))).unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while h.platform.successful_edits().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .unwrap()
        .unwrap();
    tokio_test::assert_ok!(result);

    assert_eq!(h.platform.commands.lock().len(), 3);
    assert_eq!(
        h.platform.successful_edits().last().map(|e| e.text.clone()),
        Some("pong".to_string())
    );
}

#[tokio::test]
async fn test_run_returns_when_feed_closes() {
    let (platform, feed) = MockPlatform::new().with_feed();
    let h = harness_with(platform, AuthorizationGate::allow_all());
    drop(feed);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        h.dispatcher.run(CancellationToken::new()),
    )
    .await
    .unwrap();
    tokio_test::assert_ok!(result);
}

#[tokio::test]
async fn test_bounded_fan_out_completes_all_tasks() {
    init_logging();
    let platform = Arc::new(MockPlatform::new());
    let completion = Arc::new(MockCompletion::new());
    let dispatcher = Dispatcher::builder(Arc::clone(&platform), Arc::clone(&completion))
        .max_concurrent(Some(1))
        .build();

    let handles: Vec<_> = (1..=3)
        .filter_map(|user| dispatcher.dispatch(update(user, text_message(user, "/help"))))
        .collect();
    for handle in handles {
        tokio_test::assert_ok!(handle.await);
    }

    assert_eq!(platform.successful_sends().len(), 3);
}
