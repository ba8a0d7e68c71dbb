//! Wire types exchanged with the generation endpoint

use super::{Agent, AgentSelection, Visualization};
use serde::{Deserialize, Serialize};

/// Body of the outbound generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Prompt text, already trimmed
    pub prompt: String,
    /// Agents the prompt is scoped to
    #[serde(rename = "selectedAgents")]
    pub selected_agents: Vec<Agent>,
}

impl GenerateRequest {
    /// Build a request from a prompt and the current selection
    pub fn new(prompt: impl Into<String>, agents: &AgentSelection) -> Self {
        Self {
            prompt: prompt.into(),
            selected_agents: agents.to_vec(),
        }
    }
}

/// One decoded frame of the response stream
///
/// Every field is optional; producers send whichever apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Text fragment to append
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Replacement visualization list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualizations: Option<Vec<Visualization>>,
    /// Application-level error reported mid-stream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Producer's content type tag
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl StreamEvent {
    /// Event carrying only a content fragment
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Default::default()
        }
    }

    /// Event carrying only an error
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    /// Non-empty content fragment, if any
    pub fn fragment(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_camel_case_agents_key() {
        let mut agents = AgentSelection::none();
        agents.toggle(Agent::Financial);
        let body = serde_json::to_value(GenerateRequest::new("Q3 outlook", &agents)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"prompt": "Q3 outlook", "selectedAgents": ["financial"]})
        );
    }

    #[test]
    fn test_event_accepts_type_and_unknown_fields() {
        let event: StreamEvent = serde_json::from_str(
            r##"{"type":"data_analysis","content":"# Results","extra":1}"##,
        )
        .unwrap();
        assert_eq!(event.kind.as_deref(), Some("data_analysis"));
        assert_eq!(event.fragment(), Some("# Results"));
        assert!(event.error.is_none());
    }

    #[test]
    fn test_empty_content_is_not_a_fragment() {
        let event = StreamEvent::content("");
        assert_eq!(event.fragment(), None);
    }
}
