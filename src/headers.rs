//! Header and bearer-token utilities.
//!
//! Header names are compared case-insensitively everywhere in this crate, but
//! the caller's spelling is preserved on the wire. [`HeaderSet`] is a small
//! ordered map with those semantics; it intentionally accepts any string so
//! that validation happens once, when a transport encodes the request.

use serde::Serialize;
use serde::ser::SerializeMap;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Query parameter mirrored into the `Authorization` header of uploads.
pub const BEARER_QUERY_PARAM: &str = "bearer";

/// Errors raised while parsing a caller-supplied header specification.
#[derive(Debug, Error)]
pub enum HeaderParseError {
    /// The header text is not valid JSON.
    #[error("invalid header JSON: {source}")]
    InvalidJson {
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// The header value decoded, but not to a JSON object.
    #[error("headers must be a JSON object, got {found}")]
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },
}

/// Ordered header map with case-insensitive name lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    /// Creates an empty header set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of the first header matching `name`, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns true when any case-variant of `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets `name` to `value`, replacing every existing case-variant.
    ///
    /// The replacement keeps the position of the first replaced entry and
    /// adopts the new spelling of the name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let first = self
            .entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(&name));
        self.entries.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
        match first {
            // Only entries at or after `index` were removed, so it is still in bounds.
            Some(index) => self.entries.insert(index, (name, value)),
            None => self.entries.push((name, value)),
        }
    }

    /// Sets `name` only when no case-variant is present. Returns whether it was set.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, value.into()));
        true
    }

    /// Returns `defaults` overlaid with every entry of `self`.
    ///
    /// Entries of `self` win on (case-insensitive) name conflicts.
    #[must_use]
    pub fn over(&self, defaults: HeaderSet) -> HeaderSet {
        let mut merged = defaults;
        for (name, value) in &self.entries {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no headers are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl Serialize for HeaderSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Parses a header specification into a [`HeaderSet`].
///
/// Accepts either a JSON object or a JSON string containing an object.
/// Object values that are not strings are coerced to their JSON text.
/// `null` is treated as "no headers".
///
/// # Errors
///
/// Returns [`HeaderParseError`] if string input is not valid JSON, or if the
/// input does not describe an object.
pub fn parse_headers(input: &Value) -> Result<HeaderSet, HeaderParseError> {
    match input {
        Value::Null => Ok(HeaderSet::new()),
        Value::Object(map) => Ok(map
            .iter()
            .map(|(name, value)| (name.clone(), header_value_text(value)))
            .collect()),
        Value::String(text) => {
            let decoded: Value = serde_json::from_str(text)
                .map_err(|source| HeaderParseError::InvalidJson { source })?;
            match decoded {
                Value::Object(_) => parse_headers(&decoded),
                other => Err(HeaderParseError::NotAnObject {
                    found: json_type_name(&other),
                }),
            }
        }
        other => Err(HeaderParseError::NotAnObject {
            found: json_type_name(other),
        }),
    }
}

fn header_value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Bearer token found in a URL's query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BearerToken {
    /// The token, when a non-empty `bearer` query parameter is present.
    pub token: Option<String>,
}

/// Extracts a `bearer` query parameter from `url`.
///
/// The key match is case-sensitive. The URL is left untouched: the token
/// stays in the query string of the actual request.
#[must_use]
pub fn extract_bearer_token(url: &str) -> BearerToken {
    let token = Url::parse(url).ok().and_then(|parsed| {
        parsed
            .query_pairs()
            .find(|(key, _)| key == BEARER_QUERY_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    });
    BearerToken { token }
}

/// Returns `url` with the value of any `bearer` query parameter masked.
///
/// Used wherever a URL is recorded in logs. Unparseable input is returned as-is.
#[must_use]
pub fn redact_bearer_token(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if !parsed.query_pairs().any(|(key, _)| key == BEARER_QUERY_PARAM) {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == BEARER_QUERY_PARAM {
                REDACTED.to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.into()
}

const REDACTED: &str = "REDACTED";

/// Masks the `bearer` value of `url` wherever it appears in `text`.
///
/// Error messages embed the upload URL verbatim (and sometimes the client's
/// normalized form of it), so both the raw and decoded token are masked.
#[must_use]
pub fn redact_bearer_in_text(text: &str, url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return text.to_string();
    };
    let mut redacted = text.to_string();
    let raw_values = parsed
        .query()
        .unwrap_or_default()
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| *key == BEARER_QUERY_PARAM)
        .map(|(_, value)| value.to_string());
    let decoded_values = parsed
        .query_pairs()
        .filter(|(key, _)| key == BEARER_QUERY_PARAM)
        .map(|(_, value)| value.into_owned());
    for value in raw_values.chain(decoded_values).filter(|v| !v.is_empty()) {
        redacted = redacted.replace(&value, REDACTED);
    }
    redacted
}
