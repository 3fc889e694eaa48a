//! Download body validation.
//!
//! A relay is only constant-memory if what gets piped onward is a live,
//! unread byte stream. [`validate_stream`] enforces that before a single
//! byte is forwarded; a partially read stream cannot be re-validated.

use thiserror::Error;

use crate::transport::{BodyDescriptor, ByteStream, ResponseBody};

/// Maximum number of characters kept in a body preview.
pub const PREVIEW_CHAR_LIMIT: usize = 200;

/// The download body cannot be relayed as a stream.
#[derive(Debug, Error)]
pub enum StreamValidationError {
    /// The transport handed back a fully materialized payload.
    #[error(
        "download response was buffered into memory ({byte_length} bytes) instead of streamed; refusing to relay a materialized payload"
    )]
    BufferedResponse {
        /// Size of the buffered payload.
        byte_length: usize,
    },

    /// The body has no incremental read capability.
    #[error(
        "download response body is not streamable (kind: {kind}, type: {type_name}); preview: {preview}"
    )]
    NotStreamable {
        /// Broad category of the observed value.
        kind: String,
        /// Best-effort type name, `"unknown"` when none was reported.
        type_name: String,
        /// Truncated textual preview of the value.
        preview: String,
    },
}

/// Accepts a stream body unchanged and rejects everything else.
///
/// # Errors
///
/// - [`StreamValidationError::BufferedResponse`] for [`ResponseBody::Buffered`],
///   carrying the payload's byte length
/// - [`StreamValidationError::NotStreamable`] for [`ResponseBody::Unrecognized`],
///   carrying the descriptor's kind, type name and a preview of at most
///   [`PREVIEW_CHAR_LIMIT`] characters
pub fn validate_stream(body: ResponseBody) -> Result<ByteStream, StreamValidationError> {
    match body {
        ResponseBody::Stream(stream) => Ok(stream),
        ResponseBody::Buffered(bytes) => Err(StreamValidationError::BufferedResponse {
            byte_length: bytes.len(),
        }),
        ResponseBody::Unrecognized(BodyDescriptor {
            kind,
            type_name,
            preview,
        }) => Err(StreamValidationError::NotStreamable {
            kind,
            type_name: type_name.unwrap_or_else(|| "unknown".to_string()),
            preview: truncate_preview(&preview),
        }),
    }
}

/// Truncates `text` to at most [`PREVIEW_CHAR_LIMIT`] characters.
#[must_use]
pub fn truncate_preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHAR_LIMIT).collect()
}
