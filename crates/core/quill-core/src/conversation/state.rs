//! Conversation state and its transitions

use crate::notifications::{NotificationId, Notifications, Variant};
use crate::types::{Message, MessageId, Role, StreamEvent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the current submission is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Nothing submitted yet, or the conversation was cleared
    #[default]
    Idle,
    /// Request sent, waiting for the response
    Sending,
    /// Response body is being read
    Streaming,
    /// Last stream closed cleanly
    Completed,
    /// Last submission was rejected or its transport failed
    Failed,
}

impl Phase {
    /// Whether a submission is in flight
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Phase::Sending | Phase::Streaming)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Sending => "sending",
            Phase::Streaming => "streaming",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// State transition request
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Prompt accepted: append user message and assistant placeholder
    Submitted {
        /// Trimmed prompt text
        prompt: String,
    },
    /// Prompt rejected before any network action
    Rejected {
        /// Validation message
        error: String,
    },
    /// Response headers arrived
    StreamOpened,
    /// Decoded frame to fold into the placeholder
    Event(StreamEvent),
    /// Stream closed cleanly
    Completed,
    /// Transport failure; rolls back the placeholder
    Failed {
        /// Descriptive message
        error: String,
    },
    /// Hide the current error
    DismissError,
    /// Raise a notification
    Notify {
        /// Headline
        title: String,
        /// Detail text
        description: Option<String>,
        /// Visual weight
        variant: Variant,
    },
    /// Close a notification
    DismissNotification(NotificationId),
    /// Delete a notification
    RemoveNotification(NotificationId),
    /// Drop all messages
    Clear,
}

/// Everything the interface layer renders
///
/// Only [`ConversationState::apply`] mutates it. Invariant: at most one
/// assistant message is in flight and it is always the last element.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    messages: Vec<Message>,
    error: Option<String>,
    phase: Phase,
    focus_epoch: u64,
    next_message_id: u64,
    notifications: Notifications,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ConversationState {
    /// Empty conversation keeping at most `notification_limit` toasts
    pub fn new(notification_limit: usize) -> Self {
        Self {
            messages: Vec::new(),
            error: None,
            phase: Phase::Idle,
            focus_epoch: 0,
            next_message_id: 1,
            notifications: Notifications::with_limit(notification_limit),
        }
    }

    /// Ordered messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent user-visible error
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Lifecycle phase of the latest submission
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a submission is in flight
    pub fn is_loading(&self) -> bool {
        self.phase.is_in_progress()
    }

    /// Typing indicator: in flight and nothing streamed yet
    pub fn awaiting_first_token(&self) -> bool {
        self.is_loading()
            && self
                .in_flight()
                .map(|m| m.content.is_empty())
                .unwrap_or(false)
    }

    /// Bumped every time the input should regain focus
    pub fn focus_epoch(&self) -> u64 {
        self.focus_epoch
    }

    /// Toasts
    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// The assistant message being streamed into, if any
    pub fn in_flight(&self) -> Option<&Message> {
        self.messages.last().filter(|m| m.is_in_flight())
    }

    /// Latest assistant message, finalized or not
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    fn in_flight_mut(&mut self) -> Option<&mut Message> {
        self.messages.last_mut().filter(|m| m.is_in_flight())
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = MessageId(self.next_message_id);
        self.next_message_id += 1;
        id
    }

    /// Apply one transition
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Submitted { prompt } => {
                if self.is_loading() {
                    tracing::warn!(phase = %self.phase, "ignoring submission while another is in flight");
                    return;
                }
                let user_id = self.allocate_id();
                self.messages.push(Message::user(user_id, prompt));
                let assistant_id = self.allocate_id();
                self.messages.push(Message::placeholder(assistant_id));
                self.error = None;
                self.phase = Phase::Sending;
            }
            Action::Rejected { error } => {
                self.error = Some(error);
                if !self.is_loading() {
                    self.phase = Phase::Failed;
                }
            }
            Action::StreamOpened => {
                if self.phase == Phase::Sending {
                    self.phase = Phase::Streaming;
                }
            }
            Action::Event(event) => self.fold_event(event),
            Action::Completed => {
                if let Some(message) = self.in_flight_mut() {
                    message.is_placeholder = false;
                }
                self.phase = Phase::Completed;
                self.focus_epoch += 1;
            }
            Action::Failed { error } => {
                if self.in_flight().is_some() {
                    self.messages.pop();
                }
                self.error = Some(error);
                self.phase = Phase::Failed;
                self.focus_epoch += 1;
            }
            Action::DismissError => self.error = None,
            Action::Notify {
                title,
                description,
                variant,
            } => {
                self.notifications.push(title, description, variant);
            }
            Action::DismissNotification(id) => {
                self.notifications.dismiss(id);
            }
            Action::RemoveNotification(id) => {
                self.notifications.remove(id);
            }
            Action::Clear => {
                if self.is_loading() {
                    tracing::warn!("ignoring clear while a response is streaming");
                    return;
                }
                self.messages.clear();
                self.error = None;
                self.phase = Phase::Idle;
            }
        }
    }

    fn fold_event(&mut self, event: StreamEvent) {
        let Some(message) = self.in_flight_mut() else {
            tracing::debug!("dropping stream event with no message in flight");
            return;
        };

        let has_content = match event.fragment() {
            Some(fragment) => {
                message.content.push_str(fragment);
                true
            }
            None => false,
        };
        if let Some(visualizations) = event.visualizations {
            message.visualizations = visualizations;
        }
        if !has_content {
            if let Some(error) = event.error {
                self.error = Some(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Visualization;

    fn viz(path: &str) -> Visualization {
        Visualization {
            kind: "chart".to_string(),
            path: path.to_string(),
            description: format!("chart at {}", path),
        }
    }

    fn submitted(prompt: &str) -> ConversationState {
        let mut state = ConversationState::default();
        state.apply(Action::Submitted {
            prompt: prompt.to_string(),
        });
        state
    }

    #[test]
    fn test_submit_appends_pair_and_clears_error() {
        let mut state = ConversationState::default();
        state.apply(Action::Rejected {
            error: "Please enter a prompt".into(),
        });
        state.apply(Action::Submitted {
            prompt: "hello".into(),
        });

        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[0].role, Role::User);
        assert_eq!(state.messages()[0].content, "hello");
        assert!(state.messages()[1].is_in_flight());
        assert_eq!(state.error(), None);
        assert_eq!(state.phase(), Phase::Sending);
        assert!(state.awaiting_first_token());
    }

    #[test]
    fn test_content_concatenates() {
        let mut state = submitted("greet");
        state.apply(Action::StreamOpened);
        state.apply(Action::Event(StreamEvent::content("Hel")));
        state.apply(Action::Event(StreamEvent::content("lo")));
        state.apply(Action::Completed);

        let last = state.messages().last().unwrap();
        assert_eq!(last.content, "Hello");
        assert!(!last.is_placeholder);
        assert_eq!(state.phase(), Phase::Completed);
        assert_eq!(state.focus_epoch(), 1);
    }

    #[test]
    fn test_visualizations_last_write_wins() {
        let mut state = submitted("plot it");
        state.apply(Action::Event(StreamEvent {
            content: Some("a".into()),
            visualizations: Some(vec![viz("/1.png"), viz("/2.png")]),
            ..Default::default()
        }));
        state.apply(Action::Event(StreamEvent {
            content: Some("b".into()),
            visualizations: Some(vec![viz("/3.png")]),
            ..Default::default()
        }));

        let last = state.in_flight().unwrap();
        assert_eq!(last.visualizations, vec![viz("/3.png")]);
        assert_eq!(last.content, "ab");
    }

    #[test]
    fn test_error_event_keeps_placeholder_and_streaming() {
        let mut state = submitted("x");
        state.apply(Action::StreamOpened);
        state.apply(Action::Event(StreamEvent::content("partial")));
        state.apply(Action::Event(StreamEvent::error("search quota exceeded")));

        assert_eq!(state.error(), Some("search quota exceeded"));
        assert_eq!(state.phase(), Phase::Streaming);
        assert_eq!(state.in_flight().unwrap().content, "partial");
    }

    #[test]
    fn test_error_ignored_when_content_present() {
        let mut state = submitted("x");
        state.apply(Action::Event(StreamEvent {
            content: Some("text".into()),
            error: Some("ignored".into()),
            ..Default::default()
        }));
        assert_eq!(state.error(), None);
        assert_eq!(state.in_flight().unwrap().content, "text");
    }

    #[test]
    fn test_failure_rolls_back_placeholder_after_content() {
        let mut state = submitted("x");
        state.apply(Action::StreamOpened);
        state.apply(Action::Event(StreamEvent::content("Hel")));
        state.apply(Action::Failed {
            error: "connection reset".into(),
        });

        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].role, Role::User);
        assert_eq!(state.error(), Some("connection reset"));
        assert_eq!(state.phase(), Phase::Failed);
        assert!(!state.is_loading());
    }

    #[test]
    fn test_failure_never_removes_finalized_answer() {
        let mut state = submitted("first");
        state.apply(Action::Event(StreamEvent::content("done")));
        state.apply(Action::Completed);
        state.apply(Action::Failed {
            error: "late".into(),
        });
        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[1].content, "done");
    }

    #[test]
    fn test_submission_ignored_while_in_flight() {
        let mut state = submitted("one");
        state.apply(Action::Submitted {
            prompt: "two".into(),
        });
        assert_eq!(state.messages().len(), 2);
    }

    #[test]
    fn test_events_after_completion_are_dropped() {
        let mut state = submitted("x");
        state.apply(Action::Event(StreamEvent::content("final")));
        state.apply(Action::Completed);
        state.apply(Action::Event(StreamEvent::content(" extra")));
        assert_eq!(state.messages()[1].content, "final");
    }

    #[test]
    fn test_message_ids_monotonic_across_clear() {
        let mut state = submitted("a");
        state.apply(Action::Completed);
        let last_before = state.messages()[1].id;
        state.apply(Action::Clear);
        assert!(state.messages().is_empty());
        state.apply(Action::Submitted {
            prompt: "b".into(),
        });
        assert!(state.messages()[0].id > last_before);
    }

    #[test]
    fn test_clear_refused_while_streaming() {
        let mut state = submitted("a");
        state.apply(Action::Clear);
        assert_eq!(state.messages().len(), 2);
    }

    #[test]
    fn test_notifications_flow() {
        let mut state = ConversationState::new(2);
        state.apply(Action::Notify {
            title: "Error".into(),
            description: Some("boom".into()),
            variant: Variant::Destructive,
        });
        let id = state.notifications().items()[0].id;
        state.apply(Action::DismissNotification(id));
        assert_eq!(state.notifications().open().count(), 0);
        state.apply(Action::RemoveNotification(id));
        assert!(state.notifications().items().is_empty());
    }
}
