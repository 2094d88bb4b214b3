use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    InvalidUrl,
    Serialization,
    Transport,
    Timeout,
    Config,
    Internal,
}

#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::InvalidUrl, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Serialization, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Transport, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Timeout, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Config, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Internal, message)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return FetchError::timeout("HTTP request timed out");
        }
        FetchError::transport(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::serialization(err.to_string())
    }
}
