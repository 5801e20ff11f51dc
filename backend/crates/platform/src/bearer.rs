//! Bearer Token Extraction
//!
//! Reads `Authorization: Bearer <token>` from request headers.

use axum::http::{HeaderMap, header};

/// Authorization scheme accepted by the API
pub const BEARER_SCHEME: &str = "Bearer";

/// Malformed `Authorization` header
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("Authorization header is not valid ASCII")]
    NotAscii,
    #[error("Unsupported authorization scheme")]
    Scheme,
    #[error("Authorization header carries no credentials")]
    Empty,
}

/// Extract the bearer token from headers
///
/// ## Returns
/// * `Ok(None)` - no `Authorization` header (anonymous request)
/// * `Ok(Some(token))` - a well-formed bearer header
/// * `Err(BearerError)` - the header is present but unusable
pub fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, BearerError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| BearerError::NotAscii)?.trim();

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(BearerError::Scheme);
    }

    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return Err(BearerError::Empty);
    }
    Ok(Some(token))
}
