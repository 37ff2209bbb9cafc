//! # MedBot Client
//!
//! `reqwest` implementations of [`medbot_core::MedbotApi`] (the hospital backend) and
//! [`medbot_core::DictationApi`] (transcription and analysis services).
//!
//! Bodies are read as bytes and decoded by `medbot-wire`, so schema mismatches report the
//! offending JSON path. HTTP statuses map onto [`ApiError`] in one place, [`handle_response`].

mod backend;
mod dictation;

pub use backend::HttpBackend;
pub use dictation::DictationClient;

use medbot_core::{ApiError, ApiResult, ClientConfig};
use reqwest::StatusCode;

/// Longest error body kept in [`ApiError::Server`].
const MAX_ERROR_BODY_CHARS: usize = 500;

pub(crate) fn build_http(config: &ClientConfig) -> ApiResult<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(config.request_timeout())
        .timeout(config.request_timeout())
        .build()
        .map_err(|err| ApiError::Network(format!("failed to build HTTP client: {err}")))
}

/// Send a request, mapping transport failures to [`ApiError::Network`].
pub(crate) async fn send(request: reqwest::RequestBuilder, what: &str) -> ApiResult<Vec<u8>> {
    let response = request.send().await.map_err(|err| {
        tracing::error!("{what}: request failed: {err}");
        ApiError::Network(err.to_string())
    })?;
    handle_response(response, what).await
}

/// Map a response to its body or an [`ApiError`].
///
/// - `2xx`: body bytes
/// - `401`: [`ApiError::Unauthorized`]
/// - `404`: [`ApiError::NotFound`]
/// - anything else: [`ApiError::Server`] with a truncated body
pub(crate) async fn handle_response(response: reqwest::Response, what: &str) -> ApiResult<Vec<u8>> {
    let status = response.status();
    if status.is_success() {
        return response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|err| ApiError::Network(format!("{what}: failed to read body: {err}")));
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "{what} failed");
    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound(what.to_owned())),
        _ => Err(ApiError::Server {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }),
    }
}
