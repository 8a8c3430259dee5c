//! Chat UI controller.
//!
//! Owns the transcript and implements the widget operations: `send`, `reset`
//! and the scripted demo replay. The controller is the single logical writer
//! to the transcript; handlers share it behind an `Arc`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::backend::{BackendError, ChatBackend};
use crate::transcript::{Transcript, Turn};

/// Fixed assistant message shown when the endpoint answers with a non-2xx.
///
/// Deliberately never recorded in the transcript, matching the observed
/// behavior of the widget this reimplements.
pub const FALLBACK_REPLY: &str = "Something went wrong. Please try again.";

/// Delay before each scripted demo message.
pub const DEMO_STEP_DELAY: Duration = Duration::from_millis(400);

/// Scripted demo lines, replayed in order.
pub const DEMO_SCRIPT: [&str; 4] = [
    "Hi, I was charged twice on my last invoice.",
    "The duplicate charge was on the Pro plan renewal.",
    "The account is under maria@acme.co.",
    "This is urgent because the card is at its limit.",
];

/// Outcome of a completed `send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The endpoint replied; the reply was appended to the transcript.
    Reply(String),
    /// The endpoint answered non-2xx; the fallback is displayed but the
    /// transcript keeps only the user turn.
    Fallback,
}

impl SendOutcome {
    /// Text to display for this outcome.
    #[must_use]
    pub fn display_text(&self) -> &str {
        match self {
            Self::Reply(reply) => reply,
            Self::Fallback => FALLBACK_REPLY,
        }
    }
}

/// Controller for a single chat widget instance.
pub struct ChatController {
    transcript: Transcript,
    backend: Arc<dyn ChatBackend>,
    greeting: String,
    demo_running: AtomicBool,
    demo_cancel: Mutex<CancellationToken>,
}

impl std::fmt::Debug for ChatController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatController")
            .field("transcript", &self.transcript)
            .field("greeting", &self.greeting)
            .field("demo_running", &self.demo_running)
            .finish()
    }
}

impl ChatController {
    /// Create a controller for the given backend and assistant name.
    #[must_use]
    pub fn new(backend: Arc<dyn ChatBackend>, assistant_name: &str) -> Self {
        Self {
            transcript: Transcript::new(),
            backend,
            greeting: format!("Hi! I am {assistant_name}. How can I help you today?"),
            demo_running: AtomicBool::new(false),
            demo_cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Canned greeting shown on load and after reset. Visual only, never
    /// part of the transcript.
    #[must_use]
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Shared transcript handle.
    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Send a user message to the endpoint.
    ///
    /// Appends the user turn first, posts the message plus the full
    /// transcript-so-far, then appends the assistant turn on success. A
    /// non-2xx response becomes [`SendOutcome::Fallback`] without touching
    /// the transcript further.
    ///
    /// # Errors
    ///
    /// Transport failures and malformed reply payloads are not absorbed;
    /// they bubble up with the user turn already recorded.
    pub async fn send(&self, message: &str) -> Result<SendOutcome, BackendError> {
        self.transcript.push(Turn::user(message));
        let history = self.transcript.snapshot();

        info!(
            name: "chat.send",
            transcript_len = history.len(),
            "Sending message to chat endpoint"
        );

        match self.backend.reply(message, &history).await {
            Ok(reply) => {
                self.transcript.push(Turn::assistant(&reply));
                info!(
                    name: "chat.reply",
                    reply_length = reply.len(),
                    transcript_len = self.transcript.len(),
                    "Received reply"
                );
                Ok(SendOutcome::Reply(reply))
            }
            Err(BackendError::Status(status)) => {
                warn!(
                    name: "chat.fallback",
                    status = %status,
                    "Chat endpoint returned non-success, showing fallback"
                );
                Ok(SendOutcome::Fallback)
            }
            Err(e) => Err(e),
        }
    }

    /// Clear the transcript and return the greeting to display.
    pub fn reset(&self) -> &str {
        let dropped = self.transcript.len();
        self.transcript.clear();
        info!(name: "chat.reset", dropped_turns = dropped, "Transcript cleared");
        self.greeting()
    }

    /// Whether a demo replay is currently running.
    #[must_use]
    pub fn demo_running(&self) -> bool {
        self.demo_running.load(Ordering::SeqCst)
    }

    /// Start the scripted demo replay on a background task.
    ///
    /// Returns `false` without doing anything if a replay is already
    /// running; the flag is the trigger-disable from the original widget.
    pub fn run_demo(self: Arc<Self>) -> bool {
        if self
            .demo_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let cancel = CancellationToken::new();
        *self.demo_cancel.lock().unwrap() = cancel.clone();

        tokio::spawn(async move {
            self.demo_task(cancel).await;
        });
        true
    }

    /// Cancel a running demo replay between scripted sends.
    pub fn cancel_demo(&self) {
        self.demo_cancel.lock().unwrap().cancel();
    }

    async fn demo_task(&self, cancel: CancellationToken) {
        let run_id = Uuid::new_v4();
        info!(name: "demo.started", run_id = %run_id, "Demo replay started");

        self.reset();

        for line in DEMO_SCRIPT {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!(name: "demo.cancelled", run_id = %run_id, "Demo replay cancelled");
                    break;
                }
                () = tokio::time::sleep(DEMO_STEP_DELAY) => {}
            }

            // Failed sends do not stop the replay; the fallback already
            // covers non-2xx, and anything harder is logged and skipped.
            if let Err(e) = self.send(line).await {
                error!(
                    name: "demo.send_failed",
                    run_id = %run_id,
                    error = %e,
                    "Scripted send failed, continuing"
                );
            }
        }

        // Re-enable the trigger no matter how the individual sends went.
        self.demo_running.store(false, Ordering::SeqCst);
        info!(name: "demo.finished", run_id = %run_id, "Demo replay finished");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;

    use super::*;
    use crate::transcript::Role;

    /// Backend returning scripted results while recording every call.
    struct ScriptedBackend {
        results: Mutex<VecDeque<Result<String, BackendError>>>,
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl ScriptedBackend {
        fn new(results: Vec<Result<String, BackendError>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn reply(&self, message: &str, history: &[Turn]) -> Result<String, BackendError> {
            self.calls
                .lock()
                .unwrap()
                .push((message.to_string(), history.len()));
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("scripted reply".to_string()))
        }
    }

    fn status_error() -> BackendError {
        BackendError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn payload_error() -> BackendError {
        BackendError::Payload(serde_json::from_str::<serde_json::Value>("{").unwrap_err())
    }

    #[tokio::test]
    async fn test_send_success_appends_two_turns() {
        let backend = ScriptedBackend::new(vec![Ok("Hi there".to_string())]);
        let controller = ChatController::new(Arc::clone(&backend) as Arc<dyn ChatBackend>, "Kikibot");

        let outcome = controller.send("hello").await.unwrap();
        assert_eq!(outcome, SendOutcome::Reply("Hi there".to_string()));

        let turns = controller.transcript().snapshot();
        assert_eq!(turns, vec![Turn::user("hello"), Turn::assistant("Hi there")]);

        // History posted to the endpoint already contains the user turn.
        assert_eq!(backend.calls(), vec![("hello".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_send_non_success_shows_fallback_only() {
        let backend = ScriptedBackend::new(vec![Err(status_error())]);
        let controller = ChatController::new(backend, "Kikibot");

        let outcome = controller.send("hello").await.unwrap();
        assert_eq!(outcome, SendOutcome::Fallback);
        assert_eq!(outcome.display_text(), FALLBACK_REPLY);

        // Fallback is displayed but never recorded.
        let turns = controller.transcript().snapshot();
        assert_eq!(turns, vec![Turn::user("hello")]);
    }

    #[tokio::test]
    async fn test_send_payload_error_propagates() {
        let backend = ScriptedBackend::new(vec![Err(payload_error())]);
        let controller = ChatController::new(backend, "Kikibot");

        let result = controller.send("hello").await;
        assert!(matches!(result, Err(BackendError::Payload(_))));

        // The user turn was already appended before the failure.
        assert_eq!(controller.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_clears_transcript() {
        let backend = ScriptedBackend::new(vec![Ok("sure".to_string())]);
        let controller = ChatController::new(backend, "Kikibot");

        controller.send("hello").await.unwrap();
        assert_eq!(controller.transcript().len(), 2);

        let greeting = controller.reset();
        assert_eq!(greeting, "Hi! I am Kikibot. How can I help you today?");
        assert!(controller.transcript().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_replays_script_in_order() {
        let backend = ScriptedBackend::new(vec![
            Ok("r1".to_string()),
            Err(status_error()),
            Err(payload_error()),
            Ok("r4".to_string()),
        ]);
        let controller = Arc::new(ChatController::new(
            Arc::clone(&backend) as Arc<dyn ChatBackend>,
            "Kikibot",
        ));

        // Seed a turn so the replay's leading reset is observable.
        controller.transcript().push_user("stale");

        assert!(Arc::clone(&controller).run_demo());
        assert!(!Arc::clone(&controller).run_demo(), "trigger must be disabled while running");

        while controller.demo_running() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let sent: Vec<String> = backend.calls().into_iter().map(|(m, _)| m).collect();
        let expected: Vec<String> = DEMO_SCRIPT.iter().map(ToString::to_string).collect();
        assert_eq!(sent, expected, "all four lines sent despite failures");

        // r1 + r4 succeeded: 4 user turns + 2 assistant turns, stale one gone.
        let turns = controller.transcript().snapshot();
        assert_eq!(turns.len(), 6);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1], Turn::assistant("r1"));

        // Trigger re-enabled afterward.
        assert!(Arc::clone(&controller).run_demo());
        controller.cancel_demo();
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_cancellation_stops_remaining_sends() {
        let backend = ScriptedBackend::new(vec![]);
        let controller = Arc::new(ChatController::new(
            Arc::clone(&backend) as Arc<dyn ChatBackend>,
            "Kikibot",
        ));

        assert!(Arc::clone(&controller).run_demo());
        controller.cancel_demo();

        while controller.demo_running() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(backend.calls().is_empty(), "cancelled before the first send");
        assert!(!controller.demo_running(), "flag cleared on cancel");
    }
}
