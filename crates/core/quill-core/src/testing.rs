//! Testing utilities: an in-memory transport with scripted responses

use crate::transport::{ByteStream, GenerationTransport};
use crate::types::GenerateRequest;
use crate::{QuillError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

enum Scripted {
    Body(Vec<Result<Bytes>>),
    Live(mpsc::UnboundedReceiver<Result<Bytes>>),
    Fail(QuillError),
}

/// Transport that replays queued responses in order and records requests
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedTransport {
    /// Transport with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    fn enqueue(&self, entry: Scripted) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(entry);
    }

    /// Next call streams `frames` verbatim, one chunk each
    pub fn respond_with_frames(&self, frames: &[&str]) -> &Self {
        let chunks = frames
            .iter()
            .map(|f| Ok(Bytes::copy_from_slice(f.as_bytes())))
            .collect();
        self.enqueue(Scripted::Body(chunks));
        self
    }

    /// Next call streams exactly these chunk results
    pub fn respond_with_chunks(&self, chunks: Vec<Result<Bytes>>) -> &Self {
        self.enqueue(Scripted::Body(chunks));
        self
    }

    /// Next call streams whatever is sent on the returned channel until it is dropped
    pub fn respond_live(&self) -> mpsc::UnboundedSender<Result<Bytes>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.enqueue(Scripted::Live(rx));
        tx
    }

    /// Next call fails before any body is returned
    pub fn fail_with(&self, error: QuillError) -> &Self {
        self.enqueue(Scripted::Fail(error));
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl GenerationTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open_stream(&self, request: &GenerateRequest) -> Result<ByteStream> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(Scripted::Body(chunks)) => Ok(stream::iter(chunks).boxed()),
            Some(Scripted::Live(rx)) => Ok(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            })
            .boxed()),
            Some(Scripted::Fail(error)) => Err(error),
            None => Err(QuillError::other("no scripted response left")),
        }
    }
}

/// Frame carrying a content fragment
pub fn content_frame(text: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({ "content": text })
    )
}

/// Frame carrying a mid-stream error
pub fn error_frame(message: &str) -> String {
    format!("data: {}\n\n", serde_json::json!({ "error": message }))
}

/// The producer's end-of-stream frame
pub const DONE_FRAME: &str = "data: [DONE]\n\n";
