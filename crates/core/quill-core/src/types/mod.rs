//! Core type definitions for Quill

pub mod agent;
pub mod event;
pub mod history;
pub mod message;

// Re-export commonly used types
pub use agent::*;
pub use event::*;
pub use history::*;
pub use message::*;
