//! Wishlist errors.

use thiserror::Error;

use crate::{backend::BackendError, errors::FailureKind};

#[derive(Debug, Error)]
pub enum WishlistError {
    #[error("wishlist storage error")]
    Backend(#[from] BackendError),
}

impl WishlistError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Backend(source) => source.kind(),
        }
    }
}
