use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Shown when a failed response carries no usable `detail`.
pub const GENERIC_ERROR_DETAIL: &str = "Erro desconhecido no servidor";

#[derive(Debug, Error)]
pub enum ChatApiError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: &'static str },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{detail} (HTTP {})", .status.as_u16())]
    Status { status: StatusCode, detail: String },

    /// Error declared by the relay inside the stream.
    #[error("{0}")]
    Declared(String),

    #[error("malformed stream record `{payload}`: {source}")]
    MalformedRecord {
        payload: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stream stalled: no data received for {}s", .after.as_secs())]
    Stalled { after: Duration },

    #[error("invalid response body: {0}")]
    InvalidResponseBody(String),
}

impl ChatApiError {
    /// Returns the HTTP status for failed responses.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
}

/// Extract a human-readable detail from a failed response body.
///
/// String details are used verbatim; structured details (validation error
/// lists, objects) are rendered as compact JSON.
pub fn parse_error_detail(body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.detail);

    match detail {
        Some(Value::String(text)) if !text.trim().is_empty() => text,
        Some(Value::Null) | Some(Value::String(_)) | None => GENERIC_ERROR_DETAIL.to_owned(),
        Some(other) => other.to_string(),
    }
}
