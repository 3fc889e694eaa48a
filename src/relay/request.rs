//! Transfer input: the host-shaped parameter record and the validated request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::RelayError;
use crate::headers::{HeaderSet, parse_headers};
use crate::transport::HttpMethod;

/// Method used for the upload leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum UploadMethod {
    #[default]
    Post,
    Put,
}

impl UploadMethod {
    /// Uppercase wire name of the method.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.http_method().as_str()
    }

    /// Transport-level method.
    #[must_use]
    pub fn http_method(self) -> HttpMethod {
        match self {
            Self::Post => HttpMethod::Post,
            Self::Put => HttpMethod::Put,
        }
    }
}

impl fmt::Display for UploadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            _ => Err(format!(
                "unsupported upload method '{value}': expected POST or PUT"
            )),
        }
    }
}

impl TryFrom<String> for UploadMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UploadMethod> for String {
    fn from(method: UploadMethod) -> Self {
        method.as_str().to_string()
    }
}

/// Process-wide defaults applied to parameters the caller leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayDefaults {
    pub method: UploadMethod,
    pub throw_on_error: bool,
}

impl Default for RelayDefaults {
    fn default() -> Self {
        Self {
            method: UploadMethod::Post,
            throw_on_error: true,
        }
    }
}

/// One item of host input, as received (JSON, camelCase keys).
///
/// Every field is optional at this level; [`into_request`](Self::into_request)
/// applies defaults and parses headers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferParams {
    pub download_url: String,
    pub upload_url: String,
    /// Number or numeric string; anything else means "auto-detect".
    pub content_length: Option<Value>,
    pub method: Option<String>,
    /// JSON object or JSON-encoded string.
    pub download_headers: Value,
    /// JSON object or JSON-encoded string.
    pub upload_headers: Value,
    pub throw_on_error: Option<bool>,
}

impl TransferParams {
    /// Converts host input into a [`TransferRequest`].
    ///
    /// URLs are carried over as given; emptiness is checked when the relay
    /// starts.
    ///
    /// # Errors
    ///
    /// - [`RelayError::Configuration`] for an unsupported `method`
    /// - [`RelayError::HeaderParse`] for malformed `downloadHeaders`/`uploadHeaders`
    pub fn into_request(self, defaults: &RelayDefaults) -> Result<TransferRequest, RelayError> {
        let method = match self.method.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                raw.parse::<UploadMethod>().map_err(RelayError::configuration)?
            }
            _ => defaults.method,
        };
        let download_headers = parse_headers(&self.download_headers)
            .map_err(|source| RelayError::header_parse("downloadHeaders", source))?;
        let upload_headers = parse_headers(&self.upload_headers)
            .map_err(|source| RelayError::header_parse("uploadHeaders", source))?;

        Ok(TransferRequest {
            download_url: self.download_url,
            upload_url: self.upload_url,
            content_length: self.content_length.as_ref().and_then(positive_length),
            method,
            download_headers,
            upload_headers,
            throw_on_error: self.throw_on_error.unwrap_or(defaults.throw_on_error),
        })
    }
}

/// Validated input for a single relay invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub download_url: String,
    pub upload_url: String,
    /// Explicit upload length; `None` means "take it from the download".
    pub content_length: Option<u64>,
    pub method: UploadMethod,
    pub download_headers: HeaderSet,
    pub upload_headers: HeaderSet,
    /// Raise terminal failures instead of returning them in the result.
    pub throw_on_error: bool,
}

impl TransferRequest {
    /// Creates a request with default method, no extra headers, and
    /// `throw_on_error` enabled.
    pub fn new(download_url: impl Into<String>, upload_url: impl Into<String>) -> Self {
        let defaults = RelayDefaults::default();
        Self {
            download_url: download_url.into(),
            upload_url: upload_url.into(),
            content_length: None,
            method: defaults.method,
            download_headers: HeaderSet::new(),
            upload_headers: HeaderSet::new(),
            throw_on_error: defaults.throw_on_error,
        }
    }
}

/// Normalizes a JSON length candidate. Zero, negative, fractional and
/// non-numeric values yield `None`.
#[must_use]
pub fn positive_length(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(text) => parse_positive_length(text),
        _ => None,
    }
    .filter(|length| *length > 0)
}

/// Parses a length header value. Zero and non-numeric values yield `None`.
#[must_use]
pub fn parse_positive_length(text: &str) -> Option<u64> {
    text.trim().parse::<u64>().ok().filter(|length| *length > 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_defaults_from_minimal_json() {
        let params: TransferParams = serde_json::from_value(json!({
            "downloadUrl": "https://src.example/a.bin",
            "uploadUrl": "https://dst.example/upload"
        }))
        .unwrap();
        let request = params.into_request(&RelayDefaults::default()).unwrap();
        assert_eq!(request.method, UploadMethod::Post);
        assert!(request.throw_on_error);
        assert_eq!(request.content_length, None);
        assert!(request.download_headers.is_empty());
        assert!(request.upload_headers.is_empty());
    }

    #[test]
    fn test_params_full_json() {
        let params: TransferParams = serde_json::from_value(json!({
            "downloadUrl": "https://src.example/a.bin",
            "uploadUrl": "https://dst.example/upload",
            "contentLength": 2048,
            "method": "put",
            "downloadHeaders": {"X-Src": "1"},
            "uploadHeaders": "{\"X-Dst\": \"2\"}",
            "throwOnError": false
        }))
        .unwrap();
        let request = params.into_request(&RelayDefaults::default()).unwrap();
        assert_eq!(request.method, UploadMethod::Put);
        assert!(!request.throw_on_error);
        assert_eq!(request.content_length, Some(2048));
        assert_eq!(request.download_headers.get("x-src"), Some("1"));
        assert_eq!(request.upload_headers.get("x-dst"), Some("2"));
    }

    #[test]
    fn test_params_apply_process_defaults() {
        let defaults = RelayDefaults {
            method: UploadMethod::Put,
            throw_on_error: false,
        };
        let request = TransferParams::default().into_request(&defaults).unwrap();
        assert_eq!(request.method, UploadMethod::Put);
        assert!(!request.throw_on_error);
    }

    #[test]
    fn test_params_reject_unknown_method() {
        let params = TransferParams {
            method: Some("PATCH".to_string()),
            ..TransferParams::default()
        };
        let err = params.into_request(&RelayDefaults::default()).unwrap_err();
        assert!(matches!(err, RelayError::Configuration { .. }));
        assert!(err.to_string().contains("PATCH"));
    }

    #[test]
    fn test_params_malformed_headers_name_the_field() {
        let params = TransferParams {
            upload_headers: json!("{oops"),
            ..TransferParams::default()
        };
        let err = params.into_request(&RelayDefaults::default()).unwrap_err();
        assert!(matches!(
            err,
            RelayError::HeaderParse {
                field: "uploadHeaders",
                ..
            }
        ));
    }

    #[test]
    fn test_positive_length_normalization() {
        assert_eq!(positive_length(&json!(10)), Some(10));
        assert_eq!(positive_length(&json!("10")), Some(10));
        assert_eq!(positive_length(&json!(10.0)), Some(10));
        assert_eq!(positive_length(&json!(0)), None);
        assert_eq!(positive_length(&json!("0")), None);
        assert_eq!(positive_length(&json!(-5)), None);
        assert_eq!(positive_length(&json!(1.5)), None);
        assert_eq!(positive_length(&json!("abc")), None);
        assert_eq!(positive_length(&json!(null)), None);
    }

    #[test]
    fn test_parse_positive_length_header_values() {
        assert_eq!(parse_positive_length(" 1024 "), Some(1024));
        assert_eq!(parse_positive_length("0"), None);
        assert_eq!(parse_positive_length("-1"), None);
        assert_eq!(parse_positive_length("ten"), None);
    }

    #[test]
    fn test_upload_method_parse_and_display() {
        assert_eq!("post".parse::<UploadMethod>().unwrap(), UploadMethod::Post);
        assert_eq!(" Put ".parse::<UploadMethod>().unwrap(), UploadMethod::Put);
        assert!("GET".parse::<UploadMethod>().is_err());
        assert_eq!(UploadMethod::Put.to_string(), "PUT");
    }
}
