use quill_core::{ConversationState, MessageId, Result, Role, Visualization};
use std::io::{self, Write};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Shown while waiting for the first token
pub const TYPING_INDICATOR: &str = "...";

#[derive(Clone)]
pub struct TerminalConfig {
    pub enabled: bool,
    /// Printed whenever the input regains focus; empty disables it
    pub input_prompt: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            input_prompt: "you> ".to_string(),
        }
    }
}

/// Writes the difference between successive conversation snapshots
///
/// Snapshots may be skipped (a `watch` channel coalesces updates); only the
/// latest one matters since the in-flight message only ever grows.
pub struct TerminalRenderer<W: Write> {
    out: W,
    input_prompt: String,
    last_seen: Option<MessageId>,
    streaming: Option<MessageId>,
    streamed_bytes: usize,
    shown_visualizations: Vec<Visualization>,
    typing_shown: bool,
    last_error: Option<String>,
    focus_epoch: u64,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, input_prompt: impl Into<String>) -> Self {
        Self {
            out,
            input_prompt: input_prompt.into(),
            last_seen: None,
            streaming: None,
            streamed_bytes: 0,
            shown_visualizations: Vec::new(),
            typing_shown: false,
            last_error: None,
            focus_epoch: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, state: &ConversationState) -> io::Result<()> {
        self.render_rollback(state)?;
        self.render_new_messages(state)?;
        self.render_in_flight(state)?;
        self.render_error(state)?;

        if state.focus_epoch() > self.focus_epoch {
            self.focus_epoch = state.focus_epoch();
            if !self.input_prompt.is_empty() {
                write!(self.out, "{}", self.input_prompt)?;
            }
        }
        self.out.flush()
    }

    fn render_rollback(&mut self, state: &ConversationState) -> io::Result<()> {
        let Some(id) = self.streaming else {
            return Ok(());
        };
        if state.messages().iter().any(|m| m.id == id) {
            return Ok(());
        }
        self.clear_typing()?;
        writeln!(self.out)?;
        writeln!(self.out, "[response discarded]")?;
        self.streaming = None;
        self.streamed_bytes = 0;
        Ok(())
    }

    fn render_new_messages(&mut self, state: &ConversationState) -> io::Result<()> {
        let last_seen = self.last_seen;
        let fresh: Vec<_> = state
            .messages()
            .iter()
            .filter(|m| last_seen.map_or(true, |seen| m.id > seen))
            .collect();

        for message in fresh {
            self.last_seen = Some(message.id);
            match message.role {
                Role::User => writeln!(self.out, "\n> {}", message.content)?,
                Role::Assistant => {
                    self.streaming = Some(message.id);
                    self.streamed_bytes = 0;
                    self.shown_visualizations.clear();
                }
            }
        }
        Ok(())
    }

    fn render_in_flight(&mut self, state: &ConversationState) -> io::Result<()> {
        let Some(id) = self.streaming else {
            return Ok(());
        };
        let Some(message) = state.messages().iter().find(|m| m.id == id) else {
            return Ok(());
        };

        if state.awaiting_first_token() && !self.typing_shown {
            write!(self.out, "{}", TYPING_INDICATOR)?;
            self.typing_shown = true;
        }

        let fresh = message.content.get(self.streamed_bytes..).unwrap_or("");
        if !fresh.is_empty() {
            self.clear_typing()?;
            write!(self.out, "{}", fresh)?;
            self.streamed_bytes = message.content.len();
        }

        if message.visualizations != self.shown_visualizations {
            writeln!(self.out)?;
            for viz in &message.visualizations {
                writeln!(self.out, "  [{}] {} - {}", viz.kind, viz.path, viz.description)?;
            }
            self.shown_visualizations = message.visualizations.clone();
        }

        if !message.is_placeholder {
            self.clear_typing()?;
            writeln!(self.out)?;
            self.streaming = None;
        }
        Ok(())
    }

    fn render_error(&mut self, state: &ConversationState) -> io::Result<()> {
        let current = state.error().map(str::to_string);
        if current != self.last_error {
            if let Some(message) = &current {
                self.clear_typing()?;
                writeln!(self.out, "\n[error] {}", message)?;
            }
            self.last_error = current;
        }
        Ok(())
    }

    fn clear_typing(&mut self) -> io::Result<()> {
        if self.typing_shown {
            write!(self.out, "\r{}\r", " ".repeat(TYPING_INDICATOR.len()))?;
            self.typing_shown = false;
        }
        Ok(())
    }
}

pub struct TerminalAdaptor {
    pub config: TerminalConfig,
}

impl TerminalAdaptor {
    pub fn new(config: TerminalConfig) -> Self {
        Self { config }
    }

    /// Render every state change to stdout until the controller goes away
    pub async fn start(
        &self,
        mut updates: watch::Receiver<ConversationState>,
    ) -> Result<Option<JoinHandle<()>>> {
        if !self.config.enabled {
            return Ok(None);
        }
        let prompt = self.config.input_prompt.clone();
        let handle = tokio::spawn(async move {
            let mut renderer = TerminalRenderer::new(io::stdout(), prompt);
            loop {
                let state = updates.borrow_and_update().clone();
                if let Err(e) = renderer.render(&state) {
                    tracing::warn!(error = %e, "terminal output closed");
                    break;
                }
                if updates.changed().await.is_err() {
                    break;
                }
            }
        });
        Ok(Some(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{Action, StreamEvent};

    fn render_all(states: &[ConversationState]) -> String {
        let mut renderer = TerminalRenderer::new(Vec::new(), "you> ");
        for state in states {
            renderer.render(state).unwrap();
        }
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    fn step(state: &mut ConversationState, action: Action) -> ConversationState {
        state.apply(action);
        state.clone()
    }

    #[test]
    fn test_streams_only_new_suffix() {
        let mut state = ConversationState::default();
        let snapshots = vec![
            step(&mut state, Action::Submitted { prompt: "hi".into() }),
            step(&mut state, Action::StreamOpened),
            step(&mut state, Action::Event(StreamEvent::content("Hel"))),
            step(&mut state, Action::Event(StreamEvent::content("lo"))),
            step(&mut state, Action::Completed),
        ];
        let out = render_all(&snapshots);

        assert!(out.contains("> hi\n"));
        assert_eq!(out.matches("Hel").count(), 1);
        assert!(out.contains("Hello\n") || out.contains("lo\n"));
        assert!(out.ends_with("you> "));
    }

    #[test]
    fn test_coalesced_snapshots_render_same_text() {
        let mut state = ConversationState::default();
        state.apply(Action::Submitted { prompt: "hi".into() });
        state.apply(Action::Event(StreamEvent::content("Hel")));
        state.apply(Action::Event(StreamEvent::content("lo")));
        state.apply(Action::Completed);

        let out = render_all(&[state]);
        assert!(out.contains("> hi\n"));
        assert!(out.contains("Hello\n"));
    }

    #[test]
    fn test_typing_indicator_then_cleared() {
        let mut state = ConversationState::default();
        let snapshots = vec![
            step(&mut state, Action::Submitted { prompt: "q".into() }),
            step(&mut state, Action::Event(StreamEvent::content("a"))),
        ];
        let out = render_all(&snapshots);
        let indicator = out.find(TYPING_INDICATOR).unwrap();
        let answer = out.rfind('a').unwrap();
        assert!(indicator < answer);
        assert!(out.contains("\r   \r"));
    }

    #[test]
    fn test_rollback_and_error_are_reported() {
        let mut state = ConversationState::default();
        let snapshots = vec![
            step(&mut state, Action::Submitted { prompt: "q".into() }),
            step(&mut state, Action::Event(StreamEvent::content("partial"))),
            step(
                &mut state,
                Action::Failed {
                    error: "connection reset".into(),
                },
            ),
        ];
        let out = render_all(&snapshots);
        assert!(out.contains("[response discarded]"));
        assert!(out.contains("[error] connection reset"));
    }

    #[test]
    fn test_visualizations_listed_on_change() {
        let mut state = ConversationState::default();
        let viz = Visualization {
            kind: "chart".into(),
            path: "/static/sales.png".into(),
            description: "Sales by month".into(),
        };
        let snapshots = vec![
            step(&mut state, Action::Submitted { prompt: "q".into() }),
            step(
                &mut state,
                Action::Event(StreamEvent {
                    content: Some("See chart".into()),
                    visualizations: Some(vec![viz]),
                    ..Default::default()
                }),
            ),
            step(&mut state, Action::Completed),
        ];
        let out = render_all(&snapshots);
        assert_eq!(
            out.matches("[chart] /static/sales.png - Sales by month").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_disabled_adaptor_spawns_nothing() {
        let (_tx, rx) = watch::channel(ConversationState::default());
        let adaptor = TerminalAdaptor::new(TerminalConfig {
            enabled: false,
            ..Default::default()
        });
        assert!(adaptor.start(rx).await.unwrap().is_none());
    }
}
