//! HTTP failure mapping shared by the network-backed engines.

use ares_core::AresError;
use reqwest::StatusCode;
use reqwest::header::HeaderValue;
use serde::Deserialize;

const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Extracts a readable message from an error body.
///
/// Both supported backends answer with `{"error": "..."}`; anything else is
/// passed through, shortened.
pub(crate) fn error_message(body: &str) -> String {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error)
        .unwrap_or_else(|_| body.trim().to_string());
    message.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

/// Maps a non-success status to the error taxonomy.
///
/// 503 means the backend is still loading its model, 429 is throttling, and
/// every other status is a generation failure for this call.
pub(crate) fn map_http_error(
    backend: &str,
    status: StatusCode,
    body: &str,
    retry_after_secs: Option<u64>,
) -> AresError {
    let message = error_message(body);
    match status {
        StatusCode::SERVICE_UNAVAILABLE => {
            AresError::model_not_loaded(format!("{backend} is loading, please wait: {message}"))
        }
        StatusCode::TOO_MANY_REQUESTS => AresError::rate_limited(
            format!("{backend} rate limit exceeded: {message}"),
            retry_after_secs,
        ),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AresError::generation(format!(
            "{backend} rejected the credentials ({status}): {message}"
        )),
        _ => AresError::generation(format!("{backend} returned {status}: {message}")),
    }
}

/// Maps a transport failure (no HTTP status) for a generation call.
pub(crate) fn map_request_error(backend: &str, err: &reqwest::Error) -> AresError {
    if err.is_timeout() {
        AresError::generation(format!("{backend} request timed out: {err}"))
    } else if err.is_connect() {
        AresError::generation(format!("failed to connect to {backend}: {err}"))
    } else {
        AresError::generation(format!("{backend} request failed: {err}"))
    }
}

/// Parses a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(header: Option<&HeaderValue>) -> Option<u64> {
    let value = header?.to_str().ok()?;
    // HTTP-date values are not supported.
    value.trim().parse::<u64>().ok()
}
