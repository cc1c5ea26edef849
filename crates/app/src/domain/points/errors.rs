//! Points errors.

use thiserror::Error;

use crate::{
    backend::BackendError, domain::points::models::SpinIntentUuid, errors::FailureKind,
};

#[derive(Debug, Error)]
pub enum PointsError {
    #[error("not enough points")]
    InsufficientBalance,

    #[error("user has no directory profile")]
    ProfileNotFound,

    #[error("unknown reward {0:?}")]
    UnknownReward(String),

    #[error("points were taken for a redemption that was not recorded")]
    RedemptionNotRefunded(#[source] BackendError),

    #[error("spin {intent} was not credited")]
    SpinNotCredited {
        intent: SpinIntentUuid,
        #[source]
        source: Box<PointsError>,
    },

    #[error("points storage error")]
    Backend(#[source] BackendError),
}

impl PointsError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InsufficientBalance => FailureKind::InsufficientBalance,
            Self::ProfileNotFound | Self::UnknownReward(_) => FailureKind::NotFound,
            Self::RedemptionNotRefunded(_) | Self::SpinNotCredited { .. } => {
                FailureKind::Inconsistent
            }
            Self::Backend(source) => source.kind(),
        }
    }
}

impl From<BackendError> for PointsError {
    fn from(error: BackendError) -> Self {
        Self::Backend(error)
    }
}
