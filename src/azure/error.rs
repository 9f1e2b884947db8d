use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use super::retry::IsRetryable;

/// Failures talking to Azure Resource Manager
#[derive(Debug)]
pub enum ArmError {
    /// Could not obtain a bearer token
    Credential(String),
    /// Request never produced a response
    Transport(String),
    /// ARM answered with a non-success status
    Api {
        status: StatusCode,
        code: String,
        message: String,
        /// Server-requested wait before the next attempt
        retry_after: Option<Duration>,
    },
    /// Response body did not match the expected shape
    Decode(String),
    /// Long-running operation ended in Failed or Canceled
    OperationFailed { status: String, message: String },
    /// Long-running operation did not finish before the deadline
    Timeout(String),
}

impl std::fmt::Display for ArmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArmError::Credential(e) => write!(f, "credential error: {}", e),
            ArmError::Transport(e) => write!(f, "transport error: {}", e),
            ArmError::Api {
                status,
                code,
                message,
                ..
            } => write!(f, "ARM returned {} ({}): {}", status, code, message),
            ArmError::Decode(e) => write!(f, "decode error: {}", e),
            ArmError::OperationFailed { status, message } => {
                write!(f, "operation {}: {}", status, message)
            }
            ArmError::Timeout(e) => write!(f, "timed out: {}", e),
        }
    }
}

impl std::error::Error for ArmError {}

impl IsRetryable for ArmError {
    fn is_retryable(&self) -> bool {
        match self {
            ArmError::Transport(_) => true,
            ArmError::Api { status, .. } => matches!(
                status.as_u16(),
                408 | 429 | 500 | 502 | 503 | 504
            ),
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            ArmError::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ArmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ArmError::Decode(e.to_string())
        } else {
            ArmError::Transport(e.to_string())
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ArmError {
    /// Build an `Api` error from a status and the raw ARM error envelope
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|env| env.error);

        let (code, message) = match parsed {
            Some(err) => (
                err.code.unwrap_or_else(|| "Unknown".to_string()),
                err.message.unwrap_or_default(),
            ),
            None => ("Unknown".to_string(), body.trim().to_string()),
        };

        ArmError::Api {
            status,
            code,
            message,
            retry_after: None,
        }
    }

    pub(crate) fn with_retry_after(mut self, delay: Option<Duration>) -> Self {
        if let ArmError::Api { retry_after, .. } = &mut self {
            *retry_after = delay;
        }
        self
    }

    /// True for a plain 404 from ARM
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArmError::Api { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}
