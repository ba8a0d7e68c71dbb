//! Quill Core
//!
//! Client-side core of a chat interface to a streaming content-generation
//! service. It includes:
//!
//! - Agent catalog and selection sent with every prompt
//! - A frame decoder for `data: <json>` event streams
//! - Observable conversation state with a single-writer controller
//! - A transport seam so the controller can run over HTTP or in memory
//! - Bounded notifications with stable ids
//!
//! # Example
//!
//! ```no_run
//! use quill_core::*;
//! use std::sync::Arc;
//!
//! # async fn run(transport: Arc<dyn GenerationTransport>) -> Result<()> {
//! let mut controller = ConversationController::new(transport);
//! let mut updates = controller.subscribe();
//! tokio::spawn(async move {
//!     while updates.changed().await.is_ok() {
//!         let state = updates.borrow().clone();
//!         println!("{} messages, phase {}", state.messages().len(), state.phase());
//!     }
//! });
//! controller.submit("Draft a product blurb", &AgentSelection::all()).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod conversation;
pub mod error;
pub mod notifications;
pub mod streaming;
pub mod testing;
pub mod transport;
pub mod types;
pub mod utils;

pub use config::{get_env_int, get_env_or, load_env, ClientConfig};
pub use conversation::{Action, ConversationController, ConversationState, Phase, StreamStats};
pub use error::{QuillError, Result};
pub use notifications::{Notification, NotificationId, Notifications, Variant};
pub use streaming::{decode_stream, EventStream, Frame, FrameDecoder, DONE_SENTINEL};
pub use transport::{ByteStream, GenerationTransport};
pub use types::*;
