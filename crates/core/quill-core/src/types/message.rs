//! Conversation message types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a message within its conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed by the user
    User,
    /// Streamed back from the generation service
    Assistant,
}

/// Chart or image reference attached to an assistant answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visualization {
    /// Visualization kind, e.g. `chart`
    #[serde(rename = "type")]
    pub kind: String,
    /// Location of the rendered asset
    pub path: String,
    /// Caption
    #[serde(default)]
    pub description: String,
}

/// One entry of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Monotonic id
    pub id: MessageId,
    /// Author
    pub role: Role,
    /// Text; grows while the message is an in-flight placeholder
    pub content: String,
    /// Attached visualizations, replaced wholesale on update
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visualizations: Vec<Visualization>,
    /// Whether this is the assistant message currently being streamed into
    pub is_placeholder: bool,
}

impl Message {
    /// Finalized user message
    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            content: content.into(),
            visualizations: Vec::new(),
            is_placeholder: false,
        }
    }

    /// Empty in-flight assistant message
    pub fn placeholder(id: MessageId) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: String::new(),
            visualizations: Vec::new(),
            is_placeholder: true,
        }
    }

    /// Whether this is the in-flight assistant message
    pub fn is_in_flight(&self) -> bool {
        self.role == Role::Assistant && self.is_placeholder
    }
}
