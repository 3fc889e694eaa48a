//! Stream Relay Library
//!
//! Relays a file from a source HTTP endpoint to a destination HTTP endpoint
//! without materializing it in memory: the download response body is piped
//! directly into the upload request, so backpressure from the destination
//! reaches the source.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`headers`] - Header specification parsing and bearer token extraction
//! - [`transport`] - HTTP transport abstraction and the reqwest implementation
//! - [`relay`] - Stream validation, the relay engine, and result formatting

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod headers;
pub mod relay;
pub mod transport;

mod user_agent;

// Re-export commonly used types
pub use headers::{
    BearerToken, HeaderParseError, HeaderSet, extract_bearer_token, parse_headers,
    redact_bearer_in_text, redact_bearer_token,
};
pub use relay::{
    ItemResult, Relay, RelayDefaults, RelayError, StreamValidationError, TransferParams,
    TransferRequest, TransferResult, UploadMethod,
};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportOptions};
