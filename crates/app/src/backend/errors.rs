//! Backend errors.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::errors::FailureKind;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";
const NOT_NULL_VIOLATION: &str = "23502";
const RAISED_EXCEPTION: &str = "P0001";
const NO_SINGLE_ROW: &str = "PGRST116";

/// Errors raised while talking to the managed backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport failure, timeout or an unreadable response body.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A uniqueness constraint rejected the write.
    #[error("row already exists")]
    UniqueViolation,

    /// The write referenced a row that does not exist.
    #[error("related row not found")]
    ForeignKeyViolation,

    /// A check constraint rejected the write.
    #[error("check constraint violated")]
    CheckViolation,

    /// A required column was missing.
    #[error("missing required data")]
    NotNullViolation,

    /// A stored procedure raised an exception.
    #[error("procedure raised: {0}")]
    Raised(String),

    /// The requested row does not exist.
    #[error("row not found")]
    NotFound,

    /// The credentials or session were rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// Any other non-success response.
    #[error("unexpected response from backend: {0}")]
    UnexpectedResponse(String),

    /// The response did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    /// Classify a non-success response from its status and body.
    ///
    /// Database errors carry a SQLSTATE `code`; auth errors carry an
    /// `error_code` or an OAuth-style `error`.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<ApiErrorBody>(body).unwrap_or_default();

        match parsed.code.as_deref() {
            Some(UNIQUE_VIOLATION) => return Self::UniqueViolation,
            Some(FOREIGN_KEY_VIOLATION) => return Self::ForeignKeyViolation,
            Some(CHECK_VIOLATION) => return Self::CheckViolation,
            Some(NOT_NULL_VIOLATION) => return Self::NotNullViolation,
            Some(RAISED_EXCEPTION) => return Self::Raised(parsed.describe()),
            Some(NO_SINGLE_ROW) => return Self::NotFound,
            _ => {}
        }

        match parsed.error_code.as_deref().or(parsed.error.as_deref()) {
            Some("user_already_exists" | "email_exists") => return Self::UniqueViolation,
            Some("invalid_credentials" | "invalid_grant") => return Self::Unauthorized,
            _ => {}
        }

        match status {
            StatusCode::CONFLICT => Self::UniqueViolation,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized,
            _ => Self::UnexpectedResponse(format!("status {status}: {}", parsed.describe())),
        }
    }

    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Http(_) | Self::UnexpectedResponse(_) | Self::Decode(_) => FailureKind::Transient,
            Self::UniqueViolation => FailureKind::Conflict,
            Self::ForeignKeyViolation
            | Self::CheckViolation
            | Self::NotNullViolation
            | Self::Raised(_) => FailureKind::Invalid,
            Self::NotFound => FailureKind::NotFound,
            Self::Unauthorized => FailureKind::Unauthenticated,
        }
    }
}

/// Union of the error body shapes returned by the database and auth APIs.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default, deserialize_with = "code_as_string")]
    code: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error: Option<String>,
    error_code: Option<String>,
    error_description: Option<String>,
}

impl ApiErrorBody {
    fn describe(&self) -> String {
        self.message
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
            .unwrap_or("no details")
            .to_string()
    }
}

// The auth API reports `code` as an HTTP status number.
fn code_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;

    Ok(match value {
        Some(serde_json::Value::String(code)) => Some(code),
        Some(serde_json::Value::Number(code)) => Some(code.to_string()),
        _ => None,
    })
}
