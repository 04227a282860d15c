// Error taxonomy for calls to the inference service.

use reqwest::StatusCode;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Message shown when the service gives us nothing better.
pub const GENERIC_FAILURE: &str = "Error detecting disease. Please try again.";

/// Message shown when the user submits before choosing an image.
pub const MISSING_IMAGE: &str = "Please upload an image first";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The image could not be read from disk.
    #[error("failed to read image '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Connection refused, timeout, TLS failure and friends.
    #[error("request to inference service failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx answer. `detail` is the service's own explanation, if any.
    #[error("inference service returned {}{}", .status, format_detail(.detail))]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    /// 2xx answer whose body was not the JSON we expected.
    #[error("unexpected response from inference service: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    /// Build a `Status` error from a raw response body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        ApiError::Status {
            status,
            detail: extract_detail(body),
        }
    }

    /// Text for the error panel: the service's `detail` when it sent one,
    /// the generic fallback otherwise.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

fn format_detail(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {}", d),
        None => String::new(),
    }
}

/// Pull `detail` out of an error body. Any non-empty string (whitespace
/// included) and any non-zero number is shown as sent; `""`, `0`, `false`
/// and `null` count as absent. The list form FastAPI uses for validation
/// failures is joined from each `msg`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_is_used_verbatim() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"detail":"Invalid image"}"#);
        assert_eq!(err.user_message(), "Invalid image");
        assert_eq!(
            err.to_string(),
            "inference service returned 400 Bad Request: Invalid image"
        );
    }

    #[test]
    fn missing_detail_falls_back_to_generic_message() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"boom"}"#);
        assert_eq!(err.user_message(), GENERIC_FAILURE);

        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.user_message(), GENERIC_FAILURE);
        assert_eq!(err.to_string(), "inference service returned 502 Bad Gateway");
    }

    #[test]
    fn validation_detail_list_is_joined() {
        let body = r#"{"detail":[
            {"loc":["body","file"],"msg":"field required","type":"value_error.missing"},
            {"loc":["body","model_name"],"msg":"field required","type":"value_error.missing"}
        ]}"#;
        assert_eq!(
            extract_detail(body).as_deref(),
            Some("field required; field required")
        );
    }

    #[test]
    fn empty_or_falsy_detail_is_ignored() {
        assert_eq!(extract_detail(r#"{"detail":""}"#), None);
        assert_eq!(extract_detail(r#"{"detail":0}"#), None);
        assert_eq!(extract_detail(r#"{"detail":null}"#), None);
        assert_eq!(extract_detail(r#"{"detail":false}"#), None);
        assert_eq!(extract_detail(r#"{"detail":[]}"#), None);
    }

    #[test]
    fn whitespace_and_numeric_detail_are_shown() {
        assert_eq!(extract_detail(r#"{"detail":"  "}"#).as_deref(), Some("  "));
        assert_eq!(extract_detail(r#"{"detail":42}"#).as_deref(), Some("42"));
        let err = ApiError::from_status(StatusCode::CONFLICT, r#"{"detail":409.5}"#);
        assert_eq!(err.user_message(), "409.5");
    }

    #[test]
    fn local_failures_use_generic_message() {
        let err = ApiError::Io {
            path: PathBuf::from("leaf.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }
}
