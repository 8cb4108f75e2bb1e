//! Remote service clients and the shared failure taxonomy.
//!
//! Every remote call is single-shot: a failure surfaces immediately as a
//! [`ServiceError`] and is never retried here. Timeouts come from the
//! shared HTTP client, so no call can hang an invocation indefinitely.

use crate::config::get_http_timeout_secs;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Bubblemaps holder-graph API
pub mod bubblemaps;
/// Gemini analysis client
pub mod gemini;
/// Market data API (price history, balances, PnL)
pub mod market;
/// Screenshot/chart render service
pub mod render;

/// Failure taxonomy for remote calls.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service answered well-formed but the resource is not there
    /// (e.g. map not computed for this token). Carries the
    /// service-provided explanation; shown to the user verbatim.
    #[error("{0}")]
    Unavailable(String),
    /// Non-success HTTP status from a dependency.
    #[error("API error: {0}")]
    Api(String),
    /// Connectivity or timeout failure.
    #[error("Network error: {0}")]
    Network(String),
    /// Malformed response body.
    #[error("JSON error: {0}")]
    Json(String),
}

impl ServiceError {
    /// Whether this is the well-formed "resource absent" signal rather
    /// than a transport-level failure.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Creates the HTTP client shared by all remote-service clients, with
/// the standard timeout (`HTTP_TIMEOUT_SECS`, 30s default).
#[must_use]
pub fn create_http_client() -> HttpClient {
    let timeout = Duration::from_secs(get_http_timeout_secs());
    HttpClient::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| HttpClient::new())
}

/// GET a JSON document and deserialize it.
///
/// # Errors
///
/// `Network` on connectivity issues, `Api` on non-success status codes,
/// `Json` when the body does not parse.
pub async fn get_json<T: DeserializeOwned>(
    client: &HttpClient,
    url: &str,
) -> Result<T, ServiceError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ServiceError::Network(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::Api(format!(
            "{status} - {}",
            truncate_error_body(&body)
        )));
    }

    response
        .json()
        .await
        .map_err(|e| ServiceError::Json(e.to_string()))
}

/// POST a JSON body and return the raw response bytes (used by the
/// render service, whose successful responses are PNG data).
///
/// # Errors
///
/// `Network`, `Api` as for [`get_json`]; `Unavailable` when the service
/// answers success with an empty body.
pub async fn post_json_bytes(
    client: &HttpClient,
    url: &str,
    body: &serde_json::Value,
) -> Result<Vec<u8>, ServiceError> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| ServiceError::Network(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(ServiceError::Api(format!(
            "{status} - {}",
            truncate_error_body(&text)
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ServiceError::Network(e.to_string()))?;
    if bytes.is_empty() {
        return Err(ServiceError::Unavailable(
            "Render service returned no image.".to_string(),
        ));
    }
    Ok(bytes.to_vec())
}

/// POST a JSON body and parse the JSON response (Gemini).
///
/// # Errors
///
/// Same taxonomy as [`get_json`].
pub async fn post_json(
    client: &HttpClient,
    url: &str,
    body: &serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| ServiceError::Network(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(ServiceError::Api(format!(
            "{status} - {}",
            truncate_error_body(&text)
        )));
    }

    response
        .json()
        .await
        .map_err(|e| ServiceError::Json(e.to_string()))
}

/// Keeps proxy error pages out of user-facing logs.
fn truncate_error_body(body: &str) -> String {
    let trimmed = body.trim_start();
    if trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html") {
        return "(HTML error page)".to_string();
    }
    if body.len() > 500 {
        // Walk back to a char boundary; a fixed byte offset can land
        // inside a multi-byte character.
        let mut cut = 500;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... (truncated)", &body[..cut])
    } else {
        body.to_string()
    }
}
