//! Result records and the terminal-state formatter.

use serde::Serialize;
use serde_json::Value;

use super::error::RelayError;

/// Outcome record of one relay invocation.
///
/// Serialized with camelCase keys; absent fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_status: Option<u16>,
    /// Decoded JSON, or the raw text when the body is not JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A result paired with the index of the input item it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    pub item_index: usize,
    pub json: TransferResult,
}

/// Terminal state of an invocation, before the error policy is applied.
#[derive(Debug)]
pub enum Outcome {
    Completed {
        download_status: u16,
        upload_status: u16,
        upload_response: Value,
    },
    Failed {
        error: RelayError,
        /// Status codes known when the failure happened.
        download_status: Option<u16>,
        upload_status: Option<u16>,
    },
}

/// Applies the error policy to a terminal state.
///
/// Failures are raised when `throw_on_error` is set, and always for
/// caller-input failures (see [`RelayError::is_downgradable`]). Otherwise
/// they become a `success: false` record carrying the error message and
/// whichever status codes are known.
///
/// # Errors
///
/// Returns the outcome's [`RelayError`] when the failure is raised.
pub fn format_outcome(
    outcome: Outcome,
    throw_on_error: bool,
) -> Result<TransferResult, RelayError> {
    match outcome {
        Outcome::Completed {
            download_status,
            upload_status,
            upload_response,
        } => Ok(TransferResult {
            success: true,
            download_status: Some(download_status),
            upload_status: Some(upload_status),
            upload_response: Some(upload_response),
            error: None,
        }),
        Outcome::Failed { error, .. } if throw_on_error || !error.is_downgradable() => Err(error),
        Outcome::Failed {
            error,
            download_status,
            upload_status,
        } => Ok(TransferResult {
            success: false,
            download_status,
            upload_status,
            upload_response: None,
            error: Some(error.to_string()),
        }),
    }
}

/// Interprets an upload response body: JSON when it decodes, raw text otherwise.
///
/// Never fails; invalid UTF-8 is replaced lossily.
#[must_use]
pub fn decode_upload_response(body: &[u8]) -> Value {
    let text = String::from_utf8_lossy(body);
    serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.into_owned()))
}
