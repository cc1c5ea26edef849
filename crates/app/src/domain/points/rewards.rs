//! Reward store.

use std::{fmt, sync::Arc};

use tracing::{error, info, instrument, warn};

use crate::{
    auth::UserUuid,
    domain::points::{
        errors::PointsError, ledger::PointsLedger, models::NewRedemption,
        repository::PointsRepository,
    },
};

/// A reward that can be bought with points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reward {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub cost: i64,
}

pub static REWARDS: [Reward; 5] = [
    Reward {
        id: "1",
        name: "10% off your next design",
        description: "A 10% discount on your next exclusive design",
        cost: 100,
    },
    Reward {
        id: "2",
        name: "Secret art by email",
        description: "An exclusive artwork sent straight to your inbox",
        cost: 150,
    },
    Reward {
        id: "3",
        name: "Animated certificate",
        description: "Turn your ownership certificate into an animated edition",
        cost: 200,
    },
    Reward {
        id: "4",
        name: "Early access",
        description: "See and buy the next collection before anyone else",
        cost: 250,
    },
    Reward {
        id: "5",
        name: "Realistic mockup",
        description: "See your design on skin in a professional mockup",
        cost: 300,
    },
];

#[must_use]
pub fn find_reward(id: &str) -> Option<&'static Reward> {
    REWARDS.iter().find(|reward| reward.id == id)
}

/// A completed redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redemption {
    pub reward: &'static Reward,

    /// Balance after the debit, when it could be read back.
    pub balance: Option<i64>,
}

/// Trades points for rewards.
pub struct RewardStore {
    ledger: Arc<PointsLedger>,
    repository: Arc<dyn PointsRepository>,
}

impl fmt::Debug for RewardStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewardStore").finish_non_exhaustive()
    }
}

impl RewardStore {
    #[must_use]
    pub fn new(ledger: Arc<PointsLedger>, repository: Arc<dyn PointsRepository>) -> Self {
        Self { ledger, repository }
    }

    #[must_use]
    pub fn rewards(&self) -> &'static [Reward] {
        &REWARDS
    }

    /// Debit the reward's cost, then record the redemption. When the record
    /// cannot be written the cost is credited back.
    ///
    /// # Errors
    ///
    /// Returns [`PointsError::UnknownReward`] for an unknown id,
    /// [`PointsError::InsufficientBalance`] when the debit is rejected, the
    /// record error when the refund succeeded, or
    /// [`PointsError::RedemptionNotRefunded`] when the refund failed too.
    #[instrument(skip_all, fields(%user, reward = reward_id))]
    pub async fn redeem(&self, user: UserUuid, reward_id: &str) -> Result<Redemption, PointsError> {
        let reward =
            find_reward(reward_id).ok_or_else(|| PointsError::UnknownReward(reward_id.to_string()))?;

        self.ledger.adjust(user, -reward.cost).await?;

        let recorded = self
            .repository
            .record_redemption(NewRedemption {
                user,
                reward: reward.name.to_string(),
                cost: reward.cost,
            })
            .await;

        match recorded {
            Ok(()) => {
                info!(reward = reward.id, cost = reward.cost, "reward redeemed");

                Ok(Redemption {
                    reward,
                    balance: self.ledger.cached_balance(user),
                })
            }
            Err(record_error) => {
                warn!(error = %record_error, "redemption not recorded, refunding");

                match self.ledger.adjust(user, reward.cost).await {
                    Ok(_) => Err(PointsError::Backend(record_error)),
                    Err(refund_error) => {
                        error!(
                            error = %refund_error,
                            cost = reward.cost,
                            "redemption refund failed"
                        );

                        Err(PointsError::RedemptionNotRefunded(record_error))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::{backend::BackendError, domain::points::repository::MockPointsRepository};

    use super::*;

    fn store(repository: MockPointsRepository) -> RewardStore {
        let repository = Arc::new(repository);

        RewardStore::new(Arc::new(PointsLedger::new(repository.clone())), repository)
    }

    #[test]
    fn reward_costs_range_from_100_to_300() {
        let costs: Vec<i64> = REWARDS.iter().map(|reward| reward.cost).collect();

        assert_eq!(costs, vec![100, 150, 200, 250, 300]);
        assert!(find_reward("3").is_some());
        assert!(find_reward("9").is_none());
    }

    #[tokio::test]
    async fn redeem_debits_then_records() -> TestResult {
        let user = UserUuid::new();

        let mut repository = MockPointsRepository::new();
        let mut seq = mockall::Sequence::new();
        repository
            .expect_adjust_points()
            .with(eq(user), eq(-200))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        repository
            .expect_get_points()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(50)));
        repository
            .expect_record_redemption()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let redemption = store(repository).redeem(user, "3").await?;

        assert_eq!(redemption.reward.cost, 200);
        assert_eq!(redemption.balance, Some(50));

        Ok(())
    }

    #[tokio::test]
    async fn failed_record_is_refunded() {
        let user = UserUuid::new();

        let mut repository = MockPointsRepository::new();
        repository
            .expect_adjust_points()
            .with(eq(user), eq(-100))
            .times(1)
            .returning(|_, _| Ok(()));
        repository
            .expect_adjust_points()
            .with(eq(user), eq(100))
            .times(1)
            .returning(|_, _| Ok(()));
        repository.expect_get_points().returning(|_| Ok(Some(100)));
        repository
            .expect_record_redemption()
            .returning(|_| Err(BackendError::UnexpectedResponse("down".to_string())));

        let result = store(repository).redeem(user, "1").await;

        assert!(
            matches!(result, Err(PointsError::Backend(_))),
            "expected Backend error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn failed_refund_is_inconsistent() {
        let user = UserUuid::new();

        let mut repository = MockPointsRepository::new();
        repository
            .expect_adjust_points()
            .with(eq(user), eq(-100))
            .returning(|_, _| Ok(()));
        repository
            .expect_adjust_points()
            .with(eq(user), eq(100))
            .returning(|_, _| Err(BackendError::UnexpectedResponse("down".to_string())));
        repository.expect_get_points().returning(|_| Ok(Some(0)));
        repository
            .expect_record_redemption()
            .returning(|_| Err(BackendError::UnexpectedResponse("down".to_string())));

        let result = store(repository).redeem(user, "1").await;

        assert!(
            matches!(result, Err(PointsError::RedemptionNotRefunded(_))),
            "expected RedemptionNotRefunded, got {result:?}"
        );
        assert_eq!(
            result.err().map(|error| error.kind()),
            Some(crate::errors::FailureKind::Inconsistent)
        );
    }

    #[tokio::test]
    async fn rejected_debit_records_nothing() {
        let mut repository = MockPointsRepository::new();
        repository
            .expect_adjust_points()
            .returning(|_, _| Err(BackendError::Raised("insufficient points".to_string())));
        repository.expect_record_redemption().never();

        let result = store(repository).redeem(UserUuid::new(), "5").await;

        assert!(
            matches!(result, Err(PointsError::InsufficientBalance)),
            "expected InsufficientBalance, got {result:?}"
        );
    }
}
