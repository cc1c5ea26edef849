//! Prize wheel.
//!
//! A spin debits the stake before the outcome is drawn and credits any
//! points won afterwards. Each step is journalled in a spin intent first, so
//! a spin interrupted between debit and credit can be completed or refunded
//! by the reconciler.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use jiff::Timestamp;
use rand::{Rng, RngCore, SeedableRng, rngs::StdRng};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::UserUuid,
    domain::points::{
        errors::PointsError,
        ledger::PointsLedger,
        models::{SpinIntent, SpinIntentUpdate, SpinIntentUuid, SpinState},
        repository::PointsRepository,
    },
};

/// Points taken per spin.
pub const SPIN_STAKE: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinOutcome {
    Nothing,
    Points(i64),

    /// An exclusive artwork, delivered out of band.
    ExclusiveArt,
}

impl SpinOutcome {
    /// Points credited for this outcome.
    #[must_use]
    pub const fn points(self) -> i64 {
        match self {
            Self::Points(points) => points,
            Self::Nothing | Self::ExclusiveArt => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelSegment {
    pub label: &'static str,
    pub probability: f64,
    pub outcome: SpinOutcome,
}

pub static SEGMENTS: [WheelSegment; 5] = [
    WheelSegment {
        label: "Not this time",
        probability: 0.4,
        outcome: SpinOutcome::Nothing,
    },
    WheelSegment {
        label: "+1 point",
        probability: 0.2,
        outcome: SpinOutcome::Points(1),
    },
    WheelSegment {
        label: "+2 points",
        probability: 0.15,
        outcome: SpinOutcome::Points(2),
    },
    WheelSegment {
        label: "+5 points",
        probability: 0.15,
        outcome: SpinOutcome::Points(5),
    },
    WheelSegment {
        label: "Exclusive art",
        probability: 0.1,
        outcome: SpinOutcome::ExclusiveArt,
    },
];

/// Map a roll in `[0, 1)` onto the wheel.
#[must_use]
pub fn resolve(roll: f64) -> &'static WheelSegment {
    let [.., last] = &SEGMENTS;
    let mut cumulative = 0.0;

    for segment in &SEGMENTS {
        cumulative += segment.probability;

        if roll < cumulative {
            return segment;
        }
    }

    // Rounding can leave the cumulative sum a hair under 1.0.
    last
}

/// Result of a completed spin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub intent: SpinIntentUuid,
    pub segment: &'static WheelSegment,

    /// Balance after the spin, when it could be read back.
    pub balance: Option<i64>,
}

pub struct PrizeWheel {
    ledger: Arc<PointsLedger>,
    repository: Arc<dyn PointsRepository>,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl fmt::Debug for PrizeWheel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrizeWheel").finish_non_exhaustive()
    }
}

impl PrizeWheel {
    #[must_use]
    pub fn new(ledger: Arc<PointsLedger>, repository: Arc<dyn PointsRepository>) -> Self {
        Self::with_rng(ledger, repository, StdRng::from_entropy())
    }

    #[must_use]
    pub fn with_rng(
        ledger: Arc<PointsLedger>,
        repository: Arc<dyn PointsRepository>,
        rng: impl RngCore + Send + 'static,
    ) -> Self {
        Self {
            ledger,
            repository,
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// Spin the wheel for the user.
    ///
    /// # Errors
    ///
    /// Returns [`PointsError::InsufficientBalance`] when the stake cannot be
    /// paid, in which case no spin happens, or
    /// [`PointsError::SpinNotCredited`] when the stake was taken and points
    /// were won but could not be journaled or credited.
    #[instrument(skip_all, fields(%user))]
    pub async fn spin(&self, user: UserUuid) -> Result<Spin, PointsError> {
        let balance = match self.ledger.cached_balance(user) {
            Some(balance) => balance,
            None => self.ledger.balance(user).await?,
        };

        if balance < SPIN_STAKE {
            return Err(PointsError::InsufficientBalance);
        }

        let intent = SpinIntent::new(user, SPIN_STAKE, Timestamp::now());
        let uuid = intent.uuid;

        self.repository.create_spin_intent(intent).await?;

        match self.ledger.adjust(user, -SPIN_STAKE).await {
            Ok(_) => {}
            Err(PointsError::InsufficientBalance) => {
                self.mark(uuid, SpinIntentUpdate::to(SpinState::Cancelled))
                    .await;

                return Err(PointsError::InsufficientBalance);
            }
            Err(error) => {
                warn!(%uuid, %error, "spin stake debit failed, intent left pending");

                return Err(error);
            }
        }

        self.mark(uuid, SpinIntentUpdate::to(SpinState::Debited))
            .await;

        let segment = resolve(self.roll());
        let reward = segment.outcome.points();

        if reward == 0 {
            self.mark(uuid, SpinIntentUpdate::to(SpinState::Settled).with_reward(0))
                .await;

            info!(outcome = segment.label, "spin settled");

            return Ok(Spin {
                intent: uuid,
                segment,
                balance: self.ledger.cached_balance(user),
            });
        }

        // No credit without a journaled award: a debited intent gets its stake
        // refunded by the reconciler.
        let award = SpinIntentUpdate::to(SpinState::Awarded).with_reward(reward);

        if let Err(source) = self.repository.update_spin_intent(uuid, award).await {
            error!(%uuid, reward, error = %source, "spin award not journaled, reward withheld");

            return Err(PointsError::SpinNotCredited {
                intent: uuid,
                source: Box::new(PointsError::Backend(source)),
            });
        }

        let balance = match self.ledger.adjust(user, reward).await {
            Ok(balance) => balance,
            Err(source) => {
                error!(%uuid, reward, error = %source, "spin reward not credited");

                return Err(PointsError::SpinNotCredited {
                    intent: uuid,
                    source: Box::new(source),
                });
            }
        };

        self.mark(uuid, SpinIntentUpdate::to(SpinState::Settled).with_reward(reward))
            .await;

        info!(outcome = segment.label, reward, "spin settled");

        Ok(Spin {
            intent: uuid,
            segment,
            balance,
        })
    }

    fn roll(&self) -> f64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0.0..1.0)
    }

    /// Journal writes other than the award are best-effort: the spin carries
    /// on and the stale state is left to the reconciler.
    async fn mark(&self, uuid: SpinIntentUuid, update: SpinIntentUpdate) {
        let state = update.state;

        if let Err(error) = self.repository.update_spin_intent(uuid, update).await {
            warn!(%uuid, state = state.as_str(), %error, "spin intent update failed");
        }
    }
}
