//! Error model shared by the directory client, the caches and the request layer.
//!
//! - [`FetchError`]: upstream unreachable, timed out, rejected or returned garbage. Recoverable,
//!   never cached; the next call retries.
//! - [`ConfigError`]: a required setting is absent or unparseable. Logged at startup; the
//!   affected code path is disabled instead of aborting the process.
//! - [`AppError`]: what the HTTP layer reports, with its status-code mapping.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of one upstream round trip.
///
/// `Clone` because a single in-flight fetch is shared by every caller that coalesced on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("directory transport failure: {0}")]
    Transport(String),

    #[error("directory request timed out after {0:?}")]
    Timeout(Duration),

    #[error("directory answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("directory response could not be parsed: {0}")]
    Malformed(String),

    #[error("directory upstream is not configured")]
    Unconfigured,

    #[error("directory fetch task aborted: {0}")]
    Aborted(String),
}

impl FetchError {
    /// Short, stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Timeout(_) => "timeout",
            FetchError::Status { .. } => "status",
            FetchError::Malformed(_) => "malformed",
            FetchError::Unconfigured => "unconfigured",
            FetchError::Aborted(_) => "aborted",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("setting {0} is not set")]
    Missing(&'static str),

    #[error("setting {key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    Unavailable { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. } | AppError::Unavailable { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. } | AppError::Unavailable { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn unavailable<S: Into<String>>(code: S, msg: S) -> Self { AppError::Unavailable { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::Unavailable { .. } => 503,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        // Upstream details stay in the logs; callers get a generic message.
        match err {
            FetchError::Unconfigured => AppError::unavailable("directory_unconfigured", "directory unavailable"),
            _ => AppError::unavailable("directory_unavailable", "directory unavailable"),
        }
    }
}
