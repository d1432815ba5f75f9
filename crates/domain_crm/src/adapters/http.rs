//! Shared HTTP plumbing for provider adapters
//!
//! Maps reqwest transport failures and non-success statuses onto the
//! `PortError` taxonomy so every adapter classifies failures the same way.

use core_kernel::PortError;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

/// Longest error-body excerpt carried into an error message
const BODY_SNIPPET_LEN: usize = 256;

/// Maps a reqwest transport error (timeout, DNS, refused connection) to a
/// port error.
pub(crate) fn transport_error(operation: &str, err: reqwest::Error) -> PortError {
    if err.is_timeout() {
        PortError::timeout(operation)
    } else {
        let message = format!("{operation}: {err}");
        PortError::connection_with_source(message, err)
    }
}

/// Passes a successful response through, turning any other status into a
/// port error carrying a body excerpt.
pub(crate) async fn require_success(response: Response) -> Result<Response, PortError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PortError::from_status(status.as_u16(), snippet(&body)))
}

/// Decodes a JSON body, reporting decode failures as serialization errors.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, PortError> {
    response
        .json::<T>()
        .await
        .map_err(|err| PortError::serialization(err.to_string()))
}

/// Single-entity getter handling: 404 becomes `Ok(None)`, success decodes,
/// anything else is an error.
pub(crate) async fn optional_json<T: DeserializeOwned>(
    response: Response,
) -> Result<Option<T>, PortError> {
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let response = require_success(response).await?;
    Ok(Some(read_json(response).await?))
}

fn snippet(body: &str) -> String {
    if body.len() <= BODY_SNIPPET_LEN {
        return body.to_string();
    }
    let mut end = BODY_SNIPPET_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_short_body_unchanged() {
        assert_eq!(snippet("oops"), "oops");
    }

    #[test]
    fn test_snippet_truncates_long_body() {
        let body = "x".repeat(1000);
        let out = snippet(&body);
        assert!(out.len() < body.len());
        assert!(out.ends_with('…'));
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let body = "é".repeat(300);
        let out = snippet(&body);
        assert!(out.ends_with('…'));
    }
}
