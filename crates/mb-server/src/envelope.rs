//! Response envelope
//!
//! Every command answers with the same shape: `success` plus an optional
//! human-readable `message` and structured `result` on the happy path, or a
//! single `error` string with the taxonomy kind prefixed on failure.

use mb_model::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the dispatcher sends back for one command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Whether the command succeeded
    pub success: bool,
    /// Optional human-readable note on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Structured payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// `Kind: message` rendering of the failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Bare success
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            result: None,
            error: None,
        }
    }

    /// Success with a message only
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            ..Self::ok()
        }
    }

    /// Success with a structured result
    pub fn result(value: Value) -> Self {
        Self {
            result: Some(value),
            ..Self::ok()
        }
    }

    /// Success with both
    pub fn message_with(text: impl Into<String>, value: Value) -> Self {
        Self {
            message: Some(text.into()),
            result: Some(value),
            ..Self::ok()
        }
    }

    /// Failure rendered from a model error
    pub fn failure(err: &ModelError) -> Self {
        Self {
            success: false,
            message: None,
            result: None,
            error: Some(format!("{}: {}", err.kind(), err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_prefixes_the_kind() {
        let resp = Response::failure(&ModelError::NotFound("no object named 'Pad'".into()));
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("NotFound: no object named 'Pad'"));
    }

    #[test]
    fn success_omits_empty_fields() {
        let json = serde_json::to_string(&Response::ok()).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }
}
