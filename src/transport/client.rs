//! reqwest-backed [`Transport`] implementation.
//!
//! Download bodies are exposed as `bytes_stream()` and upload bodies are
//! handed to `Body::wrap_stream`, so hyper pulls one chunk from the source
//! each time the destination is ready for one. Nothing in between reads the
//! payload.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Body, Client, Method};
use tracing::{debug, instrument};

use super::error::TransportError;
use super::{
    ByteStream, HttpMethod, RequestBody, RequestSpec, ResponseBody, ResponseMode, Transport,
    TransportResponse,
};
use crate::headers::{HeaderSet, redact_bearer_token};
use crate::user_agent;

/// Most bytes of a [`ResponseMode::Buffered`] body kept in memory; the rest is discarded.
pub const MAX_BUFFERED_BODY_BYTES: usize = 1024 * 1024;

/// Client tuning knobs.
///
/// Both timeouts default to unset, leaving the connection lifecycle to the
/// client's defaults. There is deliberately no total request timeout: it
/// would put an upper bound on relayable file size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportOptions {
    /// Maximum time to establish a connection.
    pub connect_timeout: Option<Duration>,
    /// Maximum idle time between two reads on a connection.
    pub read_timeout: Option<Duration>,
}

/// HTTP transport built on a shared `reqwest::Client`.
///
/// Create once and reuse across invocations to benefit from connection
/// pooling; no per-transfer state lives here.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with default options.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the client cannot be built
    /// (e.g. the TLS backend fails to initialize).
    pub fn new() -> Result<Self, TransportError> {
        Self::with_options(TransportOptions::default())
    }

    /// Creates a transport with explicit timeout options.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the client cannot be built.
    #[instrument(level = "debug")]
    pub fn with_options(options: TransportOptions) -> Result<Self, TransportError> {
        let client = build_client(options).map_err(|source| TransportError::Client { source })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(
        level = "debug",
        skip(self, spec),
        fields(method = %spec.method, url = %redact_bearer_token(&spec.url))
    )]
    async fn issue_request(&self, spec: RequestSpec) -> Result<TransportResponse, TransportError> {
        let RequestSpec {
            method,
            url,
            headers,
            body,
            response_mode,
        } = spec;

        let header_map = to_header_map(&url, &headers)?;
        let mut request = self
            .client
            .request(to_reqwest_method(method), url.as_str())
            .headers(header_map);
        if let RequestBody::Stream(stream) = body {
            request = request.body(Body::wrap_stream(stream));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url.as_str(), e))?;

        let status = response.status().as_u16();
        let headers = from_header_map(response.headers());
        debug!(status, "response headers received");

        let body = match response_mode {
            ResponseMode::Stream => ResponseBody::Stream(into_byte_stream(response)),
            ResponseMode::Buffered => {
                let bytes = read_capped(&url, response, MAX_BUFFERED_BODY_BYTES).await?;
                ResponseBody::Buffered(bytes)
            }
        };

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

fn build_client(options: TransportOptions) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().user_agent(user_agent::default_relay_user_agent());
    if let Some(timeout) = options.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(timeout) = options.read_timeout {
        builder = builder.read_timeout(timeout);
    }
    builder.build()
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
    }
}

/// Encodes a [`HeaderSet`] for the wire. Later case-variants win.
fn to_header_map(url: &str, headers: &HeaderSet) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TransportError::invalid_header(url, name))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| TransportError::invalid_header(url, name))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

fn from_header_map(headers: &HeaderMap) -> HeaderSet {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

/// Reads at most `limit` bytes of the body. Dropping the response afterwards
/// closes the connection instead of draining the remainder.
async fn read_capped(
    url: &str,
    response: reqwest::Response,
    limit: usize,
) -> Result<Bytes, TransportError> {
    let mut stream = response.bytes_stream();
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| TransportError::from_reqwest(url, e))?;
        let room = limit - buffer.len();
        if chunk.len() > room {
            buffer.extend_from_slice(&chunk[..room]);
            debug!(limit, "buffered response body truncated");
            break;
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

/// Wraps the response body without polling it.
fn into_byte_stream(response: reqwest::Response) -> ByteStream {
    Box::pin(
        response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other)),
    )
}
