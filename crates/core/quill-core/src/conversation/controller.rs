//! Conversation state controller
//!
//! Drives one request/response cycle per [`ConversationController::submit`]
//! and publishes every state change on a `watch` channel.

use super::state::{Action, ConversationState};
use crate::config::ClientConfig;
use crate::notifications::{NotificationId, Variant};
use crate::streaming::decode_stream;
use crate::transport::GenerationTransport;
use crate::types::{AgentSelection, GenerateRequest};
use crate::{QuillError, Result};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Validation message for a blank prompt
pub const EMPTY_PROMPT_ERROR: &str = "Please enter a prompt";

/// Validation message for an empty agent selection
pub const NO_AGENTS_ERROR: &str = "Please select at least one agent";

/// Shown when a response was abandoned before it finished
pub const INTERRUPTED_ERROR: &str = "Previous response was interrupted";

/// Counters for one finished stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Events folded into the placeholder
    pub events: usize,
    /// Characters of content received
    pub content_chars: usize,
    /// Application-level errors reported mid-stream
    pub reported_errors: usize,
}

/// Single writer of [`ConversationState`]
pub struct ConversationController {
    transport: Arc<dyn GenerationTransport>,
    state: watch::Sender<ConversationState>,
}

impl ConversationController {
    /// Controller with default settings
    pub fn new(transport: Arc<dyn GenerationTransport>) -> Self {
        Self::with_config(transport, &ClientConfig::default())
    }

    /// Controller honoring `config`'s notification limit
    pub fn with_config(transport: Arc<dyn GenerationTransport>, config: &ClientConfig) -> Self {
        let (state, _) = watch::channel(ConversationState::new(config.notification_limit));
        Self { transport, state }
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.state.subscribe()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ConversationState {
        self.state.borrow().clone()
    }

    fn dispatch(&self, action: Action) {
        self.state.send_modify(|state| state.apply(action));
    }

    /// Submit a prompt and stream the answer into the conversation
    ///
    /// Resolves once the stream has closed or failed. Validation and
    /// transport failures are reflected in the state and also returned.
    /// Errors the service reports inside the stream are not failures.
    pub async fn submit(&mut self, prompt: &str, agents: &AgentSelection) -> Result<StreamStats> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(self.reject(EMPTY_PROMPT_ERROR));
        }
        if agents.is_empty() {
            return Err(self.reject(NO_AGENTS_ERROR));
        }

        self.recover_abandoned();

        let request = GenerateRequest::new(prompt, agents);
        self.dispatch(Action::Submitted {
            prompt: prompt.to_string(),
        });
        info!(
            transport = self.transport.name(),
            agents = %agents,
            prompt_chars = prompt.chars().count(),
            "submitting prompt"
        );

        let started = Instant::now();
        match self.run_stream(&request).await {
            Ok(stats) => {
                self.dispatch(Action::Completed);
                info!(
                    events = stats.events,
                    content_chars = stats.content_chars,
                    reported_errors = stats.reported_errors,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "stream completed"
                );
                Ok(stats)
            }
            Err(e) => {
                let message = failure_message(&e);
                error!(error = %e, elapsed_ms = started.elapsed().as_millis() as u64, "stream failed");
                self.fail(message);
                Err(e)
            }
        }
    }

    async fn run_stream(&self, request: &GenerateRequest) -> Result<StreamStats> {
        let body = self.transport.open_stream(request).await?;
        self.dispatch(Action::StreamOpened);

        let mut events = decode_stream(body);
        let mut stats = StreamStats::default();
        while let Some(event) = events.next().await {
            let event = event?;
            stats.events += 1;
            if let Some(fragment) = event.fragment() {
                stats.content_chars += fragment.chars().count();
            } else if let Some(reported) = event.error.as_deref() {
                stats.reported_errors += 1;
                warn!(error = reported, "service reported an error mid-stream");
            }
            self.dispatch(Action::Event(event));
        }
        Ok(stats)
    }

    fn reject(&self, message: &str) -> QuillError {
        debug!(reason = message, "submission rejected");
        self.dispatch(Action::Rejected {
            error: message.to_string(),
        });
        QuillError::validation(message)
    }

    /// Roll back the placeholder, show `message` and raise an error toast
    fn fail(&self, message: String) {
        self.dispatch(Action::Failed {
            error: message.clone(),
        });
        self.dispatch(Action::Notify {
            title: "Error".to_string(),
            description: Some(message),
            variant: Variant::Destructive,
        });
    }

    /// Roll back a placeholder left behind by a dropped `submit` future
    fn recover_abandoned(&self) {
        if self.state.borrow().is_loading() {
            warn!("previous response was abandoned before completion");
            self.fail(INTERRUPTED_ERROR.to_string());
        }
    }

    /// Hide the current error message
    pub fn dismiss_error(&self) {
        self.dispatch(Action::DismissError);
    }

    /// Close one notification
    pub fn dismiss_notification(&self, id: NotificationId) {
        self.dispatch(Action::DismissNotification(id));
    }

    /// Delete one notification
    pub fn remove_notification(&self, id: NotificationId) {
        self.dispatch(Action::RemoveNotification(id));
    }

    /// Drop every message
    pub fn clear(&mut self) {
        self.recover_abandoned();
        self.dispatch(Action::Clear);
    }
}

fn failure_message(error: &QuillError) -> String {
    match error {
        QuillError::Status { status, message } if message.is_empty() => {
            format!("Request failed with status {}", status)
        }
        QuillError::Status { message, .. } => message.clone(),
        other => format!("Failed to generate content: {}", other),
    }
}
