use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use strum::Display;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::client::{reply_text, ChatApi, ChatReply};

/// Greeting appended to the transcript before any user input.
pub const GREETING: &str = "How can I help you?";

/// Notice text used when a reply parses but carries no assistant text.
pub const EMPTY_REPLY_NOTICE: &str = "No response received.";

/// Who produced a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum MessageOrigin {
    User,
    Assistant,
    /// Synthesized by the session itself to report an empty or failed outcome
    SystemNotice,
}

/// A single transcript entry, immutable once created
#[derive(Debug, Clone)]
pub struct Message {
    pub origin: MessageOrigin,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(origin: MessageOrigin, text: String) -> Self {
        Self {
            origin,
            text,
            timestamp: Utc::now(),
        }
    }
}

/// Interactive chat session: one user-to-AI conversational turn at a time,
/// with the transcript kept consistent with the outcome of each remote call.
///
/// Submissions are not queued or rate-limited; several calls may be in flight
/// at once, and each appends its own reply when it settles. Replies therefore
/// land in completion order, not submission order.
pub struct ChatSession {
    backend: Arc<dyn ChatApi>,
    model: String,
    system_prompt: Option<String>,
    transcript: Vec<Message>,
    pending: usize,
    outcome_tx: mpsc::UnboundedSender<Result<ChatReply>>,
    outcome_rx: mpsc::UnboundedReceiver<Result<ChatReply>>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatApi>, model: String, system_prompt: Option<String>) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let mut session = Self {
            backend,
            model,
            system_prompt,
            transcript: Vec::new(),
            pending: 0,
            outcome_tx,
            outcome_rx,
        };
        session.push(MessageOrigin::SystemNotice, GREETING.to_string());
        session
    }

    /// Submit user input.
    ///
    /// Whitespace-only input is silently ignored. Otherwise the trimmed text
    /// is appended as a user message and the remote call is initiated; this
    /// returns immediately, and the reply is appended later by
    /// [`drain_outcomes`](Self::drain_outcomes) once the call settles.
    pub fn submit(&mut self, input: &str) -> bool {
        let prompt = input.trim();
        if prompt.is_empty() {
            return false;
        }

        self.push(MessageOrigin::User, prompt.to_string());

        let backend = Arc::clone(&self.backend);
        let model = self.model.clone();
        let system_prompt = self.system_prompt.clone();
        let prompt = prompt.to_string();
        let tx = self.outcome_tx.clone();

        self.pending += 1;
        debug!(model, pending = self.pending, "submitting prompt");

        tokio::spawn(async move {
            let outcome = backend.chat(&prompt, &model, system_prompt.as_deref()).await;
            // Send fails only when the session is gone; nothing left to notify.
            let _ = tx.send(outcome);
        });

        true
    }

    /// Drain settled calls, appending exactly one message per call.
    ///
    /// Called from the UI tick loop. Returns how many calls settled.
    pub fn drain_outcomes(&mut self) -> usize {
        let mut settled = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            settled += 1;

            match outcome {
                Ok(reply) => match reply_text(&reply) {
                    Some(text) => self.push(MessageOrigin::Assistant, text),
                    None => {
                        self.push(MessageOrigin::SystemNotice, EMPTY_REPLY_NOTICE.to_string())
                    }
                },
                Err(err) => {
                    warn!(error = %err, "chat call failed");
                    self.push(MessageOrigin::SystemNotice, format!("Error: {}", err));
                }
            }
        }
        settled
    }

    /// Switch the model used for subsequent submissions
    pub fn set_model(&mut self, model: String) {
        let notice = if crate::models::is_known(&model) {
            format!("Switched model to {}", model)
        } else {
            format!(
                "Switched model to {} (not in the known model list; the endpoint may reject it)",
                model
            )
        };
        self.model = model;
        self.push(MessageOrigin::SystemNotice, notice);
    }

    /// Append a session-originated notice (help text, command feedback)
    pub fn notice(&mut self, text: String) {
        self.push(MessageOrigin::SystemNotice, text);
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Number of calls currently in flight
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn push(&mut self, origin: MessageOrigin, text: String) {
        self.transcript.push(Message::new(origin, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ContentPart, ReplyMessage};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::{oneshot, Mutex};
    use tokio::time::{sleep, timeout, Duration};

    fn reply(text: &str) -> ChatReply {
        ChatReply {
            message: Some(ReplyMessage {
                content: vec![ContentPart {
                    text: Some(text.to_string()),
                }],
            }),
        }
    }

    /// Backend that resolves immediately with a fixed outcome
    struct FixedApi(std::result::Result<ChatReply, String>);

    #[async_trait]
    impl ChatApi for FixedApi {
        async fn chat(&self, _: &str, _: &str, _: Option<&str>) -> Result<ChatReply> {
            match &self.0 {
                Ok(reply) => Ok(reply.clone()),
                Err(message) => Err(anyhow::anyhow!("{}", message)),
            }
        }
    }

    /// Backend whose calls block until the test releases them, keyed by prompt
    struct GatedApi {
        gates: Mutex<HashMap<String, oneshot::Receiver<ChatReply>>>,
    }

    #[async_trait]
    impl ChatApi for GatedApi {
        async fn chat(&self, prompt: &str, _: &str, _: Option<&str>) -> Result<ChatReply> {
            let gate = self
                .gates
                .lock()
                .await
                .remove(prompt)
                .expect("no gate for prompt");
            Ok(gate.await.expect("gate sender dropped"))
        }
    }

    fn session_with(backend: Arc<dyn ChatApi>) -> ChatSession {
        ChatSession::new(backend, "claude-sonnet-4".to_string(), None)
    }

    async fn settle(session: &mut ChatSession, count: usize) {
        timeout(Duration::from_secs(2), async {
            let mut settled = 0;
            while settled < count {
                settled += session.drain_outcomes();
                sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("calls did not settle in time");
    }

    fn texts(session: &ChatSession) -> Vec<(MessageOrigin, &str)> {
        session
            .transcript()
            .iter()
            .map(|m| (m.origin, m.text.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn starts_with_greeting() {
        let session = session_with(Arc::new(FixedApi(Ok(reply("hi")))));
        assert_eq!(
            texts(&session),
            vec![(MessageOrigin::SystemNotice, GREETING)]
        );
    }

    #[tokio::test]
    async fn whitespace_only_input_is_a_no_op() {
        let mut session = session_with(Arc::new(FixedApi(Ok(reply("hi")))));

        assert!(!session.submit(""));
        assert!(!session.submit("   \n\t "));

        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.pending(), 0);
    }

    #[tokio::test]
    async fn user_message_is_appended_synchronously() {
        let (_tx, rx) = oneshot::channel();
        let mut gates = HashMap::new();
        gates.insert("Hello".to_string(), rx);
        let mut session = session_with(Arc::new(GatedApi {
            gates: Mutex::new(gates),
        }));

        assert!(session.submit("  Hello  "));

        // Trimmed user message is visible before the call settles.
        assert_eq!(
            texts(&session).last(),
            Some(&(MessageOrigin::User, "Hello"))
        );
        assert_eq!(session.pending(), 1);
    }

    #[tokio::test]
    async fn successful_reply_is_appended_as_assistant() {
        let mut session = session_with(Arc::new(FixedApi(Ok(reply("Hi there")))));

        session.submit("Hello");
        settle(&mut session, 1).await;

        assert_eq!(
            texts(&session),
            vec![
                (MessageOrigin::SystemNotice, GREETING),
                (MessageOrigin::User, "Hello"),
                (MessageOrigin::Assistant, "Hi there"),
            ]
        );
        assert_eq!(session.pending(), 0);
    }

    #[tokio::test]
    async fn failure_becomes_a_system_notice() {
        let mut session = session_with(Arc::new(FixedApi(Err("network down".to_string()))));

        session.submit("Hello");
        settle(&mut session, 1).await;

        assert_eq!(
            texts(&session).last(),
            Some(&(MessageOrigin::SystemNotice, "Error: network down"))
        );
    }

    #[tokio::test]
    async fn empty_reply_becomes_a_system_notice() {
        let mut session = session_with(Arc::new(FixedApi(Ok(ChatReply::default()))));

        session.submit("Hello");
        settle(&mut session, 1).await;

        assert_eq!(
            texts(&session).last(),
            Some(&(MessageOrigin::SystemNotice, EMPTY_REPLY_NOTICE))
        );
    }

    #[tokio::test]
    async fn replies_land_in_completion_order() {
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        let mut gates = HashMap::new();
        gates.insert("A".to_string(), rx_a);
        gates.insert("B".to_string(), rx_b);
        let mut session = session_with(Arc::new(GatedApi {
            gates: Mutex::new(gates),
        }));

        session.submit("A");
        session.submit("B");
        assert_eq!(session.pending(), 2);

        // B settles first even though it was submitted second.
        tx_b.send(reply("reply to B")).unwrap();
        settle(&mut session, 1).await;
        tx_a.send(reply("reply to A")).unwrap();
        settle(&mut session, 1).await;

        assert_eq!(
            texts(&session),
            vec![
                (MessageOrigin::SystemNotice, GREETING),
                (MessageOrigin::User, "A"),
                (MessageOrigin::User, "B"),
                (MessageOrigin::Assistant, "reply to B"),
                (MessageOrigin::Assistant, "reply to A"),
            ]
        );
        assert_eq!(session.pending(), 0);
    }

    #[tokio::test]
    async fn set_model_records_a_notice() {
        let mut session = session_with(Arc::new(FixedApi(Ok(reply("hi")))));

        session.set_model("claude-3-opus".to_string());
        assert_eq!(session.model(), "claude-3-opus");
        assert_eq!(
            texts(&session).last(),
            Some(&(MessageOrigin::SystemNotice, "Switched model to claude-3-opus"))
        );

        session.set_model("made-up-model".to_string());
        let (origin, text) = *texts(&session).last().unwrap();
        assert_eq!(origin, MessageOrigin::SystemNotice);
        assert!(text.contains("not in the known model list"));
    }
}
