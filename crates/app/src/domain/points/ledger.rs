//! Points ledger.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use rustc_hash::FxHashMap;
use tracing::{debug, instrument, warn};

use crate::{
    auth::UserUuid,
    backend::BackendError,
    domain::points::{errors::PointsError, repository::PointsRepository},
};

/// Per-user points balances.
///
/// Every change goes through one atomic signed adjustment on the backend.
/// The cached balance is only used to skip spends that are bound to fail.
pub struct PointsLedger {
    repository: Arc<dyn PointsRepository>,
    balances: RwLock<FxHashMap<UserUuid, i64>>,
}

impl fmt::Debug for PointsLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointsLedger").finish_non_exhaustive()
    }
}

impl PointsLedger {
    #[must_use]
    pub fn new(repository: Arc<dyn PointsRepository>) -> Self {
        Self {
            repository,
            balances: RwLock::default(),
        }
    }

    /// Read the user's balance, creating the row at zero on first read.
    ///
    /// # Errors
    ///
    /// Returns [`PointsError::ProfileNotFound`] when the user has neither a
    /// balance nor a directory profile, or a backend error.
    #[instrument(skip_all, fields(%user))]
    pub async fn balance(&self, user: UserUuid) -> Result<i64, PointsError> {
        let balance = match self.repository.get_points(user).await? {
            Some(points) => points,
            None => self.initialise(user).await?,
        };

        self.cache(user, balance);

        Ok(balance)
    }

    /// Balance from the last read, without a request.
    #[must_use]
    pub fn cached_balance(&self, user: UserUuid) -> Option<i64> {
        self.balances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user)
            .copied()
    }

    /// Add a signed delta to the user's balance.
    ///
    /// Returns the balance read back afterwards, or `None` when the
    /// adjustment succeeded but the read-back did not.
    ///
    /// # Errors
    ///
    /// Returns [`PointsError::InsufficientBalance`] when a spend would take
    /// the balance below zero, or a backend error. Rejected credits are
    /// backend errors. Nothing is changed on
    /// error.
    #[instrument(skip_all, fields(%user, delta = delta))]
    pub async fn adjust(&self, user: UserUuid, delta: i64) -> Result<Option<i64>, PointsError> {
        if delta < 0
            && self
                .cached_balance(user)
                .is_some_and(|balance| balance.saturating_add(delta) < 0)
        {
            debug!("spend rejected by cached balance");

            return Err(PointsError::InsufficientBalance);
        }

        self.repository
            .adjust_points(user, delta)
            .await
            .map_err(|error| match error {
                BackendError::CheckViolation | BackendError::Raised(_) if delta < 0 => {
                    PointsError::InsufficientBalance
                }
                error => PointsError::Backend(error),
            })?;

        match self.balance(user).await {
            Ok(balance) => Ok(Some(balance)),
            Err(error) => {
                warn!(%error, "balance read-back after adjustment failed");

                self.forget(user);

                Ok(None)
            }
        }
    }

    async fn initialise(&self, user: UserUuid) -> Result<i64, PointsError> {
        if !self.repository.user_exists(user).await? {
            return Err(PointsError::ProfileNotFound);
        }

        match self.repository.create_points(user).await {
            Ok(()) => debug!("initialised points balance"),
            Err(BackendError::UniqueViolation) => debug!("points balance created concurrently"),
            Err(error) => return Err(error.into()),
        }

        Ok(self.repository.get_points(user).await?.unwrap_or_default())
    }

    fn cache(&self, user: UserUuid, balance: i64) {
        self.balances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user, balance);
    }

    fn forget(&self, user: UserUuid) {
        self.balances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user);
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::domain::points::repository::MockPointsRepository;

    use super::*;

    #[tokio::test]
    async fn first_read_initialises_a_known_user_at_zero() -> TestResult {
        let user = UserUuid::new();

        let mut repository = MockPointsRepository::new();
        let mut reads = vec![Some(0), None];
        repository
            .expect_get_points()
            .times(2)
            .returning(move |_| Ok(reads.pop().flatten()));
        repository
            .expect_user_exists()
            .with(eq(user))
            .returning(|_| Ok(true));
        repository
            .expect_create_points()
            .times(1)
            .returning(|_| Ok(()));

        let ledger = PointsLedger::new(Arc::new(repository));

        assert_eq!(ledger.balance(user).await?, 0);
        assert_eq!(ledger.cached_balance(user), Some(0));

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_initialisation_is_not_an_error() -> TestResult {
        let mut repository = MockPointsRepository::new();
        let mut reads = vec![Some(0), None];
        repository
            .expect_get_points()
            .returning(move |_| Ok(reads.pop().flatten()));
        repository.expect_user_exists().returning(|_| Ok(true));
        repository
            .expect_create_points()
            .returning(|_| Err(BackendError::UniqueViolation));

        let ledger = PointsLedger::new(Arc::new(repository));

        assert_eq!(ledger.balance(UserUuid::new()).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_has_no_balance() {
        let mut repository = MockPointsRepository::new();
        repository.expect_get_points().returning(|_| Ok(None));
        repository.expect_user_exists().returning(|_| Ok(false));
        repository.expect_create_points().never();

        let ledger = PointsLedger::new(Arc::new(repository));

        let result = ledger.balance(UserUuid::new()).await;

        assert!(
            matches!(result, Err(PointsError::ProfileNotFound)),
            "expected ProfileNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn cached_balance_short_circuits_an_overspend() -> TestResult {
        let user = UserUuid::new();

        let mut repository = MockPointsRepository::new();
        repository.expect_get_points().returning(|_| Ok(Some(30)));
        repository.expect_adjust_points().never();

        let ledger = PointsLedger::new(Arc::new(repository));

        ledger.balance(user).await?;

        let result = ledger.adjust(user, -50).await;

        assert!(
            matches!(result, Err(PointsError::InsufficientBalance)),
            "expected InsufficientBalance, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn backend_rejection_maps_to_insufficient_balance() {
        let mut repository = MockPointsRepository::new();
        repository
            .expect_adjust_points()
            .returning(|_, _| Err(BackendError::CheckViolation));
        repository.expect_get_points().never();

        let ledger = PointsLedger::new(Arc::new(repository));

        let result = ledger.adjust(UserUuid::new(), -50).await;

        assert!(
            matches!(result, Err(PointsError::InsufficientBalance)),
            "expected InsufficientBalance, got {result:?}"
        );
    }

    #[tokio::test]
    async fn rejected_credit_stays_a_backend_error() {
        let mut repository = MockPointsRepository::new();
        repository
            .expect_adjust_points()
            .returning(|_, _| Err(BackendError::Raised("user row locked".to_string())));
        repository.expect_get_points().never();

        let ledger = PointsLedger::new(Arc::new(repository));

        let result = ledger.adjust(UserUuid::new(), 5).await;

        assert!(
            matches!(result, Err(PointsError::Backend(BackendError::Raised(_)))),
            "expected a backend error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn adjust_returns_the_refreshed_balance() -> TestResult {
        let user = UserUuid::new();

        let mut repository = MockPointsRepository::new();
        repository
            .expect_adjust_points()
            .with(eq(user), eq(5))
            .times(1)
            .returning(|_, _| Ok(()));
        repository.expect_get_points().returning(|_| Ok(Some(105)));

        let ledger = PointsLedger::new(Arc::new(repository));

        assert_eq!(ledger.adjust(user, 5).await?, Some(105));
        assert_eq!(ledger.cached_balance(user), Some(105));

        Ok(())
    }
}
