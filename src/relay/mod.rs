//! Streaming relay from a download URL to an upload URL.
//!
//! This module turns one transfer request into a GET against the source and
//! a POST/PUT against the destination, with the source body piped straight
//! through as the upload body.
//!
//! # Features
//!
//! - Constant-memory transfers: the download stream is never read or
//!   accumulated before it reaches the upload
//! - Stream validation that rejects buffered or non-streamable bodies
//! - `Content-Length` propagation (explicit value, then the source's header)
//! - `bearer` query parameter mirrored into `Authorization`
//! - Caller-selected error policy: raise, or report in the result record

mod engine;
mod error;
mod request;
mod result;
mod stream;

pub use engine::{DEFAULT_UPLOAD_CONTENT_TYPE, DOWNLOAD_ACCEPT, Relay};
pub use error::{RelayError, TransferPhase};
pub use request::{
    RelayDefaults, TransferParams, TransferRequest, UploadMethod, parse_positive_length,
    positive_length,
};
pub use result::{ItemResult, Outcome, TransferResult, decode_upload_response, format_outcome};
pub use stream::{PREVIEW_CHAR_LIMIT, StreamValidationError, truncate_preview, validate_stream};
