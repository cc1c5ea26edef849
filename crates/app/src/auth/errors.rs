//! Auth service errors.

use thiserror::Error;

use crate::{backend::BackendError, errors::FailureKind};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not signed in")]
    NotAuthenticated,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account already exists")]
    AlreadyExists,

    #[error("username already taken")]
    UsernameTaken,

    #[error("profile not found")]
    ProfileNotFound,

    #[error("invalid account details: {0}")]
    Validation(#[from] ValidationError),

    #[error("backend error")]
    Backend(#[source] BackendError),
}

impl AuthError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotAuthenticated | Self::InvalidCredentials => FailureKind::Unauthenticated,
            Self::AlreadyExists | Self::UsernameTaken => FailureKind::Conflict,
            Self::ProfileNotFound => FailureKind::NotFound,
            Self::Validation(_) => FailureKind::Invalid,
            Self::Backend(source) => source.kind(),
        }
    }
}

impl From<BackendError> for AuthError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::UniqueViolation => Self::AlreadyExists,
            BackendError::Unauthorized => Self::InvalidCredentials,
            other => Self::Backend(other),
        }
    }
}

/// Registration and profile form problems, checked before any request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    MissingName,

    #[error("username is required")]
    MissingUsername,

    #[error("username may only contain letters, digits and underscores")]
    InvalidUsername,

    #[error("email address is malformed")]
    InvalidEmail,

    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),
}
