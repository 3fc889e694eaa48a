//! Relay engine: GET from one endpoint, pipe the body into a POST/PUT to another.
//!
//! # Overview
//!
//! One invocation walks a fixed path:
//!
//! ```text
//! Idle -> Downloading -> DownloadValidated -> Uploading -> Completed
//!            |                 |                  |
//!            +-- TransportError / DownloadFailed / StreamInvalid / UploadFailed
//! ```
//!
//! The download body is never read here. It is validated as a stream and
//! moved into the upload request, so the transport pulls each chunk from the
//! source only when the destination is ready for it. Memory in flight stays
//! bounded by the transport's chunk window, whatever the file size.
//!
//! # Example
//!
//! ```no_run
//! use stream_relay::relay::{Relay, TransferRequest, UploadMethod};
//! use stream_relay::transport::ReqwestTransport;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let relay = Relay::new(ReqwestTransport::new()?);
//! let mut request = TransferRequest::new(
//!     "https://source.example/video.mp4",
//!     "https://dest.example/upload?bearer=TOKEN",
//! );
//! request.method = UploadMethod::Put;
//! let result = relay.relay(&request).await?;
//! println!("uploaded: {}", result.success);
//! # Ok(())
//! # }
//! ```

use futures_util::TryStreamExt;
use tracing::{debug, info, instrument, warn};

use super::error::{RelayError, TransferPhase};
use super::request::{RelayDefaults, TransferParams, TransferRequest, parse_positive_length};
use super::result::{ItemResult, Outcome, TransferResult, decode_upload_response, format_outcome};
use super::stream::{truncate_preview, validate_stream};
use crate::headers::{HeaderSet, extract_bearer_token, redact_bearer_in_text, redact_bearer_token};
use crate::transport::{
    HttpMethod, RequestBody, RequestSpec, ResponseBody, ResponseMode, Transport, TransportError,
};

/// `Accept` value sent with every download.
pub const DOWNLOAD_ACCEPT: &str = "*/*";

/// `Content-Type` sent with uploads unless the caller overrides it.
pub const DEFAULT_UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

const ACCEPT: &str = "Accept";
const AUTHORIZATION: &str = "Authorization";
const CONTENT_LENGTH: &str = "Content-Length";
const CONTENT_TYPE: &str = "Content-Type";

/// Streams files from a download URL into an upload URL.
///
/// Holds no per-transfer state; one `Relay` can serve any number of
/// sequential or concurrent invocations.
#[derive(Debug, Clone)]
pub struct Relay<T> {
    transport: T,
    defaults: RelayDefaults,
}

impl<T: Transport> Relay<T> {
    /// Creates a relay with built-in defaults (POST, raise on error).
    pub fn new(transport: T) -> Self {
        Self::with_defaults(transport, RelayDefaults::default())
    }

    /// Creates a relay whose defaults apply to [`TransferParams`] input.
    pub fn with_defaults(transport: T, defaults: RelayDefaults) -> Self {
        Self {
            transport,
            defaults,
        }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs one transfer and applies the request's error policy.
    ///
    /// # Errors
    ///
    /// - [`RelayError::Configuration`] when either URL is blank, regardless
    ///   of `throw_on_error`; no request is issued
    /// - any other [`RelayError`] when `throw_on_error` is set
    #[instrument(
        skip(self, request),
        fields(
            download_url = %request.download_url,
            upload_url = %redact_bearer_token(&request.upload_url),
            method = %request.method
        )
    )]
    pub async fn relay(&self, request: &TransferRequest) -> Result<TransferResult, RelayError> {
        validate_urls(request)?;

        let outcome = self.run(request).await;
        match &outcome {
            Outcome::Completed {
                download_status,
                upload_status,
                ..
            } => info!(download_status, upload_status, "relay complete"),
            Outcome::Failed { error, .. } => {
                // The returned error keeps the full upload URL; logs never see the token.
                let error = redact_bearer_in_text(&error.to_string(), &request.upload_url);
                if request.throw_on_error {
                    debug!(%error, "relay failed");
                } else {
                    warn!(%error, "relay failed; reporting in result");
                }
            }
        }
        format_outcome(outcome, request.throw_on_error)
    }

    /// Parses host input with this relay's defaults, then runs it.
    ///
    /// # Errors
    ///
    /// Same as [`relay`](Self::relay), plus [`RelayError::HeaderParse`] for
    /// malformed header input.
    pub async fn relay_params(&self, params: TransferParams) -> Result<TransferResult, RelayError> {
        let request = params.into_request(&self.defaults)?;
        self.relay(&request).await
    }

    /// Relays each item in order, one at a time.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Item`] for the first item that raises; later
    /// items are not attempted.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn relay_items(
        &self,
        items: Vec<TransferParams>,
    ) -> Result<Vec<ItemResult>, RelayError> {
        let mut results = Vec::with_capacity(items.len());
        for (index, params) in items.into_iter().enumerate() {
            let json = self
                .relay_params(params)
                .await
                .map_err(|source| RelayError::Item {
                    index,
                    source: Box::new(source),
                })?;
            results.push(ItemResult {
                item_index: index,
                json,
            });
        }
        info!(
            succeeded = results.iter().filter(|item| item.json.success).count(),
            total = results.len(),
            "batch complete"
        );
        Ok(results)
    }

    /// Drives the transfer to a terminal state. Transport errors from either
    /// leg are enriched with both URLs here and nowhere else.
    async fn run(&self, request: &TransferRequest) -> Outcome {
        let transport_failure = |phase: TransferPhase,
                                 source: TransportError,
                                 download_status: Option<u16>| Outcome::Failed {
            error: RelayError::transport(
                phase,
                &request.download_url,
                &request.upload_url,
                source,
            ),
            download_status,
            upload_status: None,
        };

        debug!("downloading");
        let download = match self.transport.issue_request(download_spec(request)).await {
            Ok(response) => response,
            Err(source) => return transport_failure(TransferPhase::Download, source, None),
        };

        let download_status = download.status;
        if !is_success(download_status) {
            // Dropping the unread body here releases the source connection.
            return Outcome::Failed {
                error: RelayError::download_status(&request.download_url, download_status),
                download_status: Some(download_status),
                upload_status: None,
            };
        }

        let content_length = effective_content_length(request.content_length, &download.headers);
        let stream = match validate_stream(download.body) {
            Ok(stream) => stream,
            Err(error) => {
                return Outcome::Failed {
                    error: error.into(),
                    download_status: Some(download_status),
                    upload_status: None,
                };
            }
        };
        debug!(download_status, ?content_length, "download validated; uploading");

        let upload_spec = RequestSpec {
            method: request.method.http_method(),
            url: request.upload_url.clone(),
            headers: upload_headers(request, content_length),
            body: RequestBody::Stream(stream),
            response_mode: ResponseMode::Buffered,
        };
        let upload = match self.transport.issue_request(upload_spec).await {
            Ok(response) => response,
            Err(source) => {
                return transport_failure(TransferPhase::Upload, source, Some(download_status));
            }
        };

        let upload_status = upload.status;
        let body = match read_body(&request.upload_url, upload.body).await {
            Ok(body) => body,
            Err(source) => {
                return Outcome::Failed {
                    error: RelayError::transport(
                        TransferPhase::Upload,
                        &request.download_url,
                        &request.upload_url,
                        source,
                    ),
                    download_status: Some(download_status),
                    upload_status: Some(upload_status),
                };
            }
        };

        if !is_success(upload_status) {
            let text = String::from_utf8_lossy(&body);
            let preview = Some(truncate_preview(text.trim())).filter(|p| !p.is_empty());
            return Outcome::Failed {
                error: RelayError::upload_status(
                    &request.upload_url,
                    request.method,
                    upload_status,
                    preview,
                ),
                download_status: Some(download_status),
                upload_status: Some(upload_status),
            };
        }

        Outcome::Completed {
            download_status,
            upload_status,
            upload_response: decode_upload_response(&body),
        }
    }
}

fn validate_urls(request: &TransferRequest) -> Result<(), RelayError> {
    if request.download_url.trim().is_empty() {
        return Err(RelayError::configuration("Download URL is required"));
    }
    if request.upload_url.trim().is_empty() {
        return Err(RelayError::configuration("Upload URL is required"));
    }
    Ok(())
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn download_spec(request: &TransferRequest) -> RequestSpec {
    let defaults: HeaderSet = [(ACCEPT, DOWNLOAD_ACCEPT)].into_iter().collect();
    RequestSpec {
        method: HttpMethod::Get,
        url: request.download_url.clone(),
        headers: request.download_headers.over(defaults),
        body: RequestBody::Empty,
        response_mode: ResponseMode::Stream,
    }
}

/// Explicit length wins over the download's `content-length`. Zero or
/// non-numeric candidates count as absent at either tier.
pub(crate) fn effective_content_length(
    explicit: Option<u64>,
    download_headers: &HeaderSet,
) -> Option<u64> {
    explicit.filter(|length| *length > 0).or_else(|| {
        download_headers
            .get(CONTENT_LENGTH)
            .and_then(parse_positive_length)
    })
}

/// Builds upload headers: default content type, caller headers, then
/// `Authorization` and `Content-Length` only where the caller set none.
pub(crate) fn upload_headers(request: &TransferRequest, content_length: Option<u64>) -> HeaderSet {
    let defaults: HeaderSet = [(CONTENT_TYPE, DEFAULT_UPLOAD_CONTENT_TYPE)]
        .into_iter()
        .collect();
    let mut headers = request.upload_headers.over(defaults);

    if let Some(token) = extract_bearer_token(&request.upload_url).token
        && headers.insert_if_absent(AUTHORIZATION, format!("Bearer {token}"))
    {
        debug!("mirrored bearer query parameter into Authorization header");
    }
    if let Some(length) = content_length {
        headers.insert_if_absent(CONTENT_LENGTH, length.to_string());
    }
    headers
}

/// Reads a (small) response body into memory.
async fn read_body(url: &str, body: ResponseBody) -> Result<Vec<u8>, TransportError> {
    match body {
        ResponseBody::Buffered(bytes) => Ok(bytes.to_vec()),
        ResponseBody::Stream(stream) => stream
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .map_err(|source| TransportError::body(url, source)),
        ResponseBody::Unrecognized(descriptor) => Ok(descriptor.preview.into_bytes()),
    }
}
