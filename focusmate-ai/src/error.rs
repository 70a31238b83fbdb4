use std::time::Duration;

use thiserror::Error;

/// Failures raised by the host runtime or by a capability session.
///
/// These never cross the public boundary of the core: the invoker and the
/// health monitor classify them into `InvocationResult` / `HealthStatus`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HostError {
    #[error("capability provider could not be inspected: {0}")]
    Access(String),

    #[error("failed to create {capability} session: {message}")]
    Create {
        capability: &'static str,
        message: String,
    },

    #[error("{capability} call failed: {message}")]
    Call {
        capability: &'static str,
        message: String,
    },

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("authentication failed, check the API key")]
    Unauthorized,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("remote request failed: {0}")]
    Remote(String),
}

impl HostError {
    pub fn call(capability: &'static str, message: impl Into<String>) -> Self {
        Self::Call {
            capability,
            message: message.into(),
        }
    }

    pub fn create(capability: &'static str, message: impl Into<String>) -> Self {
        Self::Create {
            capability,
            message: message.into(),
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Unexpected internal failure of the diagnostics tool itself.
///
/// Capability problems are reported inside the `DiagnosticReport`; this
/// error means the tool is broken, not the capability.
#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("diagnostic task '{task}' was cancelled")]
    Cancelled { task: &'static str },
}

/// Origin-trial token decoding errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,

    #[error("token is not valid base64: {0}")]
    Base64(String),

    #[error("token payload is truncated")]
    Truncated,

    #[error("token payload is not valid JSON: {0}")]
    Json(String),
}
