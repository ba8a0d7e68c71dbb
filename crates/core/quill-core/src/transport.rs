//! Seam between the conversation controller and the network

use crate::types::GenerateRequest;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

/// Raw response body, chunked as it arrives
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Opens streaming generation requests
///
/// Implementations resolve once the response status is known. A non-success
/// status or a connection failure is an `Err`; failures while reading the
/// body surface as `Err` items of the returned stream.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    /// Transport name used in logs
    fn name(&self) -> &str;

    /// Send `request` and hand back the response body
    async fn open_stream(&self, request: &GenerateRequest) -> Result<ByteStream>;
}
