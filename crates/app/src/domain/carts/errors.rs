//! Cart errors.

use thiserror::Error;

use crate::{backend::BackendError, errors::FailureKind};

#[derive(Debug, Error)]
pub enum CartError {
    #[error("design is already in the cart")]
    AlreadyInCart,

    #[error("design is not available")]
    Unavailable,

    #[error("cart storage error")]
    Backend(#[source] BackendError),
}

impl CartError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::AlreadyInCart => FailureKind::Conflict,
            Self::Unavailable => FailureKind::Unavailable,
            Self::Backend(source) => source.kind(),
        }
    }
}

impl From<BackendError> for CartError {
    fn from(error: BackendError) -> Self {
        Self::Backend(error)
    }
}
