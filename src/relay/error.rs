//! Error taxonomy for relay invocations.

use std::fmt;

use thiserror::Error;

use super::request::UploadMethod;
use super::stream::StreamValidationError;
use crate::headers::HeaderParseError;
use crate::transport::TransportError;

/// Which leg of the transfer a transport failure happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    Download,
    Upload,
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download => f.write_str("download"),
            Self::Upload => f.write_str("upload"),
        }
    }
}

/// Terminal failure of a relay invocation.
///
/// `Configuration` and `HeaderParse` describe bad caller input and always
/// abort the invocation. Every other variant is a runtime failure that the
/// caller may ask to receive as a result record instead; see
/// [`is_downgradable`](Self::is_downgradable).
#[derive(Debug, Error)]
pub enum RelayError {
    /// Required input missing or malformed.
    #[error("configuration error: {message}")]
    Configuration {
        /// What is wrong with the input.
        message: String,
    },

    /// A header specification could not be parsed.
    #[error("invalid {field}: {source}")]
    HeaderParse {
        /// Input field the headers came from.
        field: &'static str,
        /// The parse failure.
        #[source]
        source: HeaderParseError,
    },

    /// Download responded outside 2xx.
    #[error("download failed with HTTP {status} from {url}")]
    DownloadStatus {
        /// Response status code.
        status: u16,
        /// Download URL.
        url: String,
    },

    /// The download body is not a relayable stream.
    ///
    /// The validator's message already carries the full diagnostics, so it
    /// is surfaced unchanged.
    #[error(transparent)]
    StreamValidation(#[from] StreamValidationError),

    /// Upload responded outside 2xx.
    #[error(
        "upload failed with HTTP {status} ({method} {url}){}",
        body_suffix(.body_preview.as_deref())
    )]
    UploadStatus {
        /// Response status code.
        status: u16,
        /// Method used for the upload.
        method: UploadMethod,
        /// Upload URL.
        url: String,
        /// Truncated response body, when the server sent one.
        body_preview: Option<String>,
    },

    /// Network or protocol failure, enriched with both transfer URLs.
    #[error(
        "{phase} transport error: {source} (Download URL: {download_url}, Upload URL: {upload_url})"
    )]
    Transport {
        /// Leg on which the failure happened.
        phase: TransferPhase,
        /// Download URL of the invocation.
        download_url: String,
        /// Upload URL of the invocation.
        upload_url: String,
        /// The transport failure.
        #[source]
        source: TransportError,
    },

    /// A batch item raised; the batch stops at this item.
    #[error("item {index}: {source}")]
    Item {
        /// Zero-based index of the failing item.
        index: usize,
        /// The item's failure.
        #[source]
        source: Box<RelayError>,
    },
}

fn body_suffix(body_preview: Option<&str>) -> String {
    match body_preview {
        Some(preview) if !preview.is_empty() => format!(": {preview}"),
        _ => String::new(),
    }
}

impl RelayError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a header parse error for `field`.
    pub fn header_parse(field: &'static str, source: HeaderParseError) -> Self {
        Self::HeaderParse { field, source }
    }

    /// Creates a download status error.
    pub fn download_status(url: impl Into<String>, status: u16) -> Self {
        Self::DownloadStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an upload status error.
    pub fn upload_status(
        url: impl Into<String>,
        method: UploadMethod,
        status: u16,
        body_preview: Option<String>,
    ) -> Self {
        Self::UploadStatus {
            status,
            method,
            url: url.into(),
            body_preview,
        }
    }

    /// Wraps a transport failure with the invocation's URLs.
    pub fn transport(
        phase: TransferPhase,
        download_url: impl Into<String>,
        upload_url: impl Into<String>,
        source: TransportError,
    ) -> Self {
        Self::Transport {
            phase,
            download_url: download_url.into(),
            upload_url: upload_url.into(),
            source,
        }
    }

    /// Returns true when the failure may be reported as a result record.
    ///
    /// Caller-input failures never are.
    #[must_use]
    pub fn is_downgradable(&self) -> bool {
        match self {
            Self::Configuration { .. } | Self::HeaderParse { .. } => false,
            Self::Item { source, .. } => source.is_downgradable(),
            _ => true,
        }
    }
}
