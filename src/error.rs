//! Error taxonomy for controller interactions

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedfishError {
    /// Connection, DNS or TLS failure; nothing useful came back
    #[error("transport error: {0}")]
    Transport(String),

    /// The capability probe was rejected with HTTP 401
    #[error("controller rejected the credentials (HTTP 401), check username/password or token")]
    Unauthorized,

    #[error("controller does not support this feature: {0}")]
    UnsupportedVersion(String),

    /// The call returned something other than its documented success code
    #[error("unexpected status {status}, body: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("invalid invocation: {0}")]
    InvalidInvocation(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("server did not report PowerState Off within {0}s")]
    PowerOffTimeout(u64),
}

impl From<reqwest::Error> for RedfishError {
    fn from(value: reqwest::Error) -> Self {
        RedfishError::Transport(value.to_string())
    }
}

pub type Result<T, E = RedfishError> = std::result::Result<T, E>;
