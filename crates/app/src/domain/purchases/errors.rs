//! Purchase errors.

use thiserror::Error;

use crate::{
    backend::BackendError,
    domain::{
        carts::{CartError, RemovedEntries},
        designs::DesignUuid,
    },
    errors::FailureKind,
};

#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("design is no longer available")]
    Unavailable,

    #[error("cart is empty")]
    EmptyCart,

    /// Checkout stopped because these entries were no longer available.
    /// They have been removed from the cart.
    #[error("{} cart designs are no longer available", .0.len())]
    ItemsUnavailable(RemovedEntries),

    /// The design was marked sold but its purchase record was not written.
    #[error("design {design} was sold without a purchase record")]
    RecordMissing {
        design: DesignUuid,
        #[source]
        source: BackendError,
    },

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("purchase storage error")]
    Backend(#[source] BackendError),
}

impl PurchaseError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unavailable | Self::ItemsUnavailable(_) => FailureKind::Unavailable,
            Self::EmptyCart => FailureKind::Invalid,
            Self::RecordMissing { .. } => FailureKind::Inconsistent,
            Self::Cart(source) => source.kind(),
            Self::Backend(source) => source.kind(),
        }
    }

    /// Titles of the entries removed by checkout validation.
    #[must_use]
    pub fn unavailable_titles(&self) -> Vec<String> {
        match self {
            Self::ItemsUnavailable(removed) => removed.iter().map(|row| row.label()).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<BackendError> for PurchaseError {
    fn from(error: BackendError) -> Self {
        Self::Backend(error)
    }
}
