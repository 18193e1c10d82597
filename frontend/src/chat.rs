//! Chat-turn consumer
//!
//! The user turn is appended to the history as soon as it is submitted. The
//! paired assistant turn (or a synthesized failure turn) is appended when
//! that request settles. By default one turn is outstanding at a time.

use crate::dataflow::{Actor, Relay, relay};
use crate::gateway::GatewayClient;
use crate::notifications::make_error_user_friendly;
use futures::StreamExt;
use futures::task::{LocalSpawn, SpawnError};
use futures_signals::signal::{Mutable, Signal, SignalExt};
use shared::{ChatMessage, ChatRequest, ChatRole, ChatSection, VisualizationSpec};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    /// Blank input, history untouched.
    Empty,
    /// A previous turn is still outstanding.
    Busy,
}

#[derive(Clone)]
pub struct ChatSession {
    history: Mutable<Vec<ChatMessage>>,
    outstanding: Mutable<usize>,
    allow_concurrent: bool,
    chat_turn_submitted_relay: Relay<ChatRequest>,
    _worker: Actor<()>,
}

impl ChatSession {
    pub fn start(
        config: &ChatSection,
        client: GatewayClient,
        spawner: &dyn LocalSpawn,
    ) -> Result<Self, SpawnError> {
        let history = Mutable::new(Vec::new());
        let outstanding = Mutable::new(0);
        let (chat_turn_submitted_relay, turns) = relay::<ChatRequest>();

        let answer_turn = {
            let history = history.clone();
            let outstanding = outstanding.clone();
            let failure_message = config.failure_message.clone();
            move |request: ChatRequest| {
                let reply = client.call(|gateway| gateway.chat(request));
                let history = history.clone();
                let outstanding = outstanding.clone();
                let failure_message = failure_message.clone();
                async move {
                    let message = match reply.await {
                        Ok(message) => message,
                        Err(error) => {
                            log::error!("Chat request failed: {error}");
                            ChatMessage::assistant(format!(
                                "{} {}",
                                failure_message,
                                make_error_user_friendly(&error.to_string())
                            ))
                        }
                    };
                    history.lock_mut().push(message);
                    *outstanding.lock_mut() -= 1;
                }
            }
        };

        let allow_concurrent = config.allow_concurrent;
        let worker = Actor::new((), spawner, move |_state| async move {
            if allow_concurrent {
                turns.for_each_concurrent(None, answer_turn).await;
            } else {
                turns.for_each(answer_turn).await;
            }
        })?;

        Ok(Self {
            history,
            outstanding,
            allow_concurrent,
            chat_turn_submitted_relay,
            _worker: worker,
        })
    }

    pub fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Empty;
        }
        if !self.allow_concurrent && self.is_sending() {
            log::warn!("Chat turn rejected, previous answer still pending");
            return SubmitOutcome::Busy;
        }

        let request = {
            let mut history = self.history.lock_mut();
            history.push(ChatMessage::user(text));
            ChatRequest {
                history: history.clone(),
            }
        };
        *self.outstanding.lock_mut() += 1;
        self.chat_turn_submitted_relay.send(request);
        SubmitOutcome::Sent
    }

    pub fn is_sending(&self) -> bool {
        self.outstanding.get() > 0
    }

    /// Drives the disabled state of the input in serialized mode.
    pub fn is_sending_signal(&self) -> impl Signal<Item = bool> + use<> {
        self.outstanding.signal_ref(|count| *count > 0).dedupe()
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.get_cloned()
    }

    pub fn history_signal(&self) -> impl Signal<Item = Vec<ChatMessage>> + use<> {
        self.history.signal_cloned()
    }

    /// Chart attached to the most recent assistant turn that has one.
    pub fn latest_visualization(&self) -> Option<VisualizationSpec> {
        self.history
            .lock_ref()
            .iter()
            .rev()
            .filter(|message| message.role == ChatRole::Assistant)
            .find_map(|message| message.visualization.clone())
    }
}
