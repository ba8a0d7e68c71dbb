//! Conversation state and the controller that owns it

pub mod controller;
pub mod state;

pub use controller::{
    ConversationController, StreamStats, EMPTY_PROMPT_ERROR, INTERRUPTED_ERROR, NO_AGENTS_ERROR,
};
pub use state::{Action, ConversationState, Phase};
