//! Catalog errors.

use thiserror::Error;

use crate::{backend::BackendError, errors::FailureKind};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to load designs")]
    Fetch(#[source] BackendError),

    #[error("failed to replenish designs")]
    Replenish(#[source] BackendError),
}

impl CatalogError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Fetch(source) | Self::Replenish(source) => source.kind(),
        }
    }
}
