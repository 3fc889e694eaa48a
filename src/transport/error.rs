//! Error types for the transport layer.
//!
//! Transport errors describe a single failed HTTP exchange. They carry the
//! URL of that exchange only; the relay engine adds the remaining transfer
//! context once, at its outer boundary.

use thiserror::Error;

/// Errors that can occur while issuing a request through a [`Transport`](super::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, broken pipe, etc.)
    #[error("network error for {url}: {source}")]
    Network {
        /// The URL of the failed request.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout for {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// A header name or value could not be encoded onto the wire.
    #[error("invalid header '{name}' for {url}")]
    InvalidHeader {
        /// The URL of the request being built.
        url: String,
        /// The offending header name.
        name: String,
    },

    /// Reading a response body failed part-way.
    #[error("failed reading response body from {url}: {source}")]
    Body {
        /// The URL whose body was being read.
        url: String,
        /// The underlying read error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Failure raised by a non-reqwest transport implementation.
    #[error("{message}")]
    Other {
        /// Human-readable failure description.
        message: String,
    },
}

impl TransportError {
    /// Classifies a reqwest error raised while talking to `url`.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates a body read error.
    pub fn body(url: impl Into<String>, source: std::io::Error) -> Self {
        Self::Body {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self::InvalidHeader {
            url: url.into(),
            name: name.into(),
        }
    }

    /// Creates a free-form transport error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

// No `From<reqwest::Error>`: every variant needs the request URL for context,
// so callers go through `from_reqwest()`.
