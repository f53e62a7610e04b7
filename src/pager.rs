//! Transport edge of pagination.
//!
//! The store hands back an opaque resume token; clients only ever see it
//! base64url-encoded (no padding) in the `Continue` response header, and send
//! it back the same way. Nothing here looks inside the decoded token.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::store::SelectionPredicate;

pub const CONTINUE_HEADER: HeaderName = HeaderName::from_static("continue");

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PagerError {
    #[error("continue token is not valid base64url")]
    InvalidBase64,

    #[error("continue token is not valid UTF-8")]
    InvalidUtf8,

    #[error("continue header contains non-visible characters")]
    InvalidHeader,

    #[error("invalid limit {0:?}: must be a non-negative integer")]
    InvalidLimit(String),
}

/// Query parameters accepted by every list endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    /// Fallback for clients that cannot set headers
    #[serde(rename = "continue")]
    pub continue_token: Option<String>,
}

pub fn encode_continue(token: &str) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(token.as_bytes())
}

pub fn decode_continue(encoded: &str) -> Result<String, PagerError> {
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(encoded.trim())
        .map_err(|_| PagerError::InvalidBase64)?;
    String::from_utf8(bytes).map_err(|_| PagerError::InvalidUtf8)
}

fn parse_limit(raw: Option<&str>, api: &ApiConfig) -> Result<i64, PagerError> {
    let limit = match raw.map(str::trim) {
        None | Some("") => 0,
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|l| *l >= 0)
            .ok_or_else(|| PagerError::InvalidLimit(raw.to_string()))?,
    };
    let limit = if limit == 0 { api.default_page_size } else { limit };
    Ok(if api.max_page_size > 0 {
        limit.min(api.max_page_size)
    } else {
        limit
    })
}

/// Build the store predicate for one list request
pub fn predicate_from_request(
    headers: &HeaderMap,
    query: &ListQuery,
    subcollection: Option<&str>,
    api: &ApiConfig,
) -> Result<SelectionPredicate, PagerError> {
    let encoded = match headers.get(&CONTINUE_HEADER) {
        Some(value) => Some(value.to_str().map_err(|_| PagerError::InvalidHeader)?),
        None => query.continue_token.as_deref(),
    };
    let continue_token = match encoded {
        Some(encoded) if !encoded.trim().is_empty() => decode_continue(encoded)?,
        _ => String::new(),
    };

    Ok(SelectionPredicate {
        continue_token,
        limit: parse_limit(query.limit.as_deref(), api)?,
        subcollection: subcollection.unwrap_or_default().to_string(),
    })
}

/// Header value for the next page, if the store reported one
pub fn continue_header(pred: &SelectionPredicate) -> Option<HeaderValue> {
    if !pred.has_more() {
        return None;
    }
    // base64url output is always a valid header value
    HeaderValue::from_str(&encode_continue(&pred.continue_token)).ok()
}
