//! HTTP transport abstraction used by the relay engine.
//!
//! The relay never talks to an HTTP client directly. It hands a
//! [`RequestSpec`] to a [`Transport`] and receives a [`TransportResponse`]
//! whose body has already been tagged as a stream, a buffered payload, or
//! something unrecognized. That tagging happens exactly once, here at the
//! boundary, so downstream code can match on it instead of guessing.
//!
//! [`ReqwestTransport`] is the production implementation.

mod client;
mod error;

pub use client::{MAX_BUFFERED_BODY_BYTES, ReqwestTransport, TransportOptions};
pub use error::TransportError;

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;

use crate::headers::HeaderSet;

/// Incremental, not-yet-consumed response or request body.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// HTTP methods issued by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    /// Uppercase wire name of the method.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the transport should hand back the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Return the body untouched as a [`ResponseBody::Stream`]. No decoding,
    /// no parsing, nothing read before the caller asks.
    Stream,
    /// Read the body into memory, up to [`MAX_BUFFERED_BODY_BYTES`]. Only for
    /// small payloads such as an upload acknowledgement.
    Buffered,
}

/// Request body handed to the transport.
pub enum RequestBody {
    /// No body (downloads).
    Empty,
    /// A stream piped through to the wire as it is polled.
    Stream(ByteStream),
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Everything a transport needs to issue one request.
#[derive(Debug)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HeaderSet,
    pub body: RequestBody,
    pub response_mode: ResponseMode,
}

/// Diagnostic description of a body that is neither a stream nor bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyDescriptor {
    /// Broad category of the value (e.g. `"object"`, `"string"`).
    pub kind: String,
    /// Best-effort concrete type name.
    pub type_name: Option<String>,
    /// Textual preview of the value.
    pub preview: String,
}

/// Response body, tagged once when the response is received.
pub enum ResponseBody {
    /// Incremental byte stream that nothing has read from yet.
    Stream(ByteStream),
    /// Fully materialized payload.
    Buffered(Bytes),
    /// Something that cannot be consumed incrementally.
    Unrecognized(BodyDescriptor),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Buffered(bytes) => write!(f, "Buffered({} bytes)", bytes.len()),
            Self::Unrecognized(descriptor) => f
                .debug_tuple("Unrecognized")
                .field(descriptor)
                .finish(),
        }
    }
}

/// Status, headers and tagged body of a completed exchange.
#[derive(Debug)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderSet,
    pub body: ResponseBody,
}

/// Capability to issue a single HTTP request.
///
/// Implementations must honor [`ResponseMode::Stream`] by returning the body
/// without reading it, and must forward a [`RequestBody::Stream`] without
/// accumulating it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues `spec` and returns the response metadata and tagged body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] for network, protocol, or request-building
    /// failures. Non-2xx statuses are not errors at this layer.
    async fn issue_request(&self, spec: RequestSpec) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn issue_request(&self, spec: RequestSpec) -> Result<TransportResponse, TransportError> {
        (**self).issue_request(spec).await
    }
}
