//! Cart store.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockWriteGuard},
};

use rust_decimal::Decimal;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::UserUuid,
    backend::BackendError,
    domain::{
        carts::{
            errors::CartError,
            models::{self, AddOutcome, CartEntry, CartRow, NewCartEntry},
            repository::CartRepository,
        },
        designs::{DesignStatus, DesignUuid, DesignsRepository},
    },
};

/// Entries purged by a validation pass.
pub type RemovedEntries = SmallVec<[CartRow; 4]>;

/// Per-user pending selections.
///
/// The cached entries only ever reflect what the backend last returned.
pub struct CartStore {
    carts: Arc<dyn CartRepository>,
    designs: Arc<dyn DesignsRepository>,
    entries: RwLock<FxHashMap<UserUuid, Vec<CartEntry>>>,
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore").finish_non_exhaustive()
    }
}

impl CartStore {
    #[must_use]
    pub fn new(carts: Arc<dyn CartRepository>, designs: Arc<dyn DesignsRepository>) -> Self {
        Self {
            carts,
            designs,
            entries: RwLock::default(),
        }
    }

    /// Add a design to the user's cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AlreadyInCart`] without any request when the
    /// design is already listed, [`CartError::Unavailable`] when its live
    /// status is not available, or a backend error.
    #[instrument(skip_all, fields(%user, %design))]
    pub async fn add(&self, user: UserUuid, design: DesignUuid) -> Result<AddOutcome, CartError> {
        if self.contains(user, design) {
            return Err(CartError::AlreadyInCart);
        }

        let status = self.designs.get_status(design).await?;

        if status != Some(DesignStatus::Available) {
            debug!(?status, "refusing to add unavailable design");

            return Err(CartError::Unavailable);
        }

        let outcome = match self
            .carts
            .create_cart_item(NewCartEntry { user, design })
            .await
        {
            Ok(()) => AddOutcome::Added,
            Err(BackendError::UniqueViolation) => {
                debug!("design was added by another session");

                AddOutcome::AlreadyPresent
            }
            Err(error) => return Err(error.into()),
        };

        if let Err(error) = self.load(user).await {
            warn!(%error, "cart resync after add failed");
        }

        Ok(outcome)
    }

    /// Remove a design from the user's cart. Removing an absent design
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the delete fails.
    #[instrument(skip_all, fields(%user, %design))]
    pub async fn remove(&self, user: UserUuid, design: DesignUuid) -> Result<(), CartError> {
        self.carts.delete_cart_item(user, design).await?;

        if let Err(error) = self.load(user).await {
            warn!(%error, "cart resync after remove failed");

            self.retain(user, |entry| entry.design.uuid != design);
        }

        Ok(())
    }

    /// Delete every entry for the user.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the delete fails; the cached entries are
    /// then left as they were.
    #[instrument(skip_all, fields(%user))]
    pub async fn clear(&self, user: UserUuid) -> Result<(), CartError> {
        self.carts.clear_cart_items(user).await?;

        self.write().remove(&user);

        Ok(())
    }

    /// Fetch the user's entries, hiding those whose design is no longer
    /// available. Hidden entries stay stored until the next validation.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the entries cannot be read.
    pub async fn load(&self, user: UserUuid) -> Result<Vec<CartEntry>, CartError> {
        let rows = self.carts.list_cart_items(user).await?;

        let entries: Vec<CartEntry> = rows
            .into_iter()
            .filter_map(CartRow::into_available_entry)
            .collect();

        self.write().insert(user, entries.clone());

        Ok(entries)
    }

    /// Cached entries from the last load.
    #[must_use]
    pub fn list(&self, user: UserUuid) -> Vec<CartEntry> {
        self.read(user, <[CartEntry]>::to_vec)
    }

    #[must_use]
    pub fn contains(&self, user: UserUuid, design: DesignUuid) -> bool {
        self.read(user, |entries| {
            entries.iter().any(|entry| entry.design.uuid == design)
        })
    }

    #[must_use]
    pub fn total(&self, user: UserUuid) -> Decimal {
        self.read(user, models::total)
    }

    /// Check every stored entry against the designs' live statuses, delete
    /// the ones no longer available and resync.
    ///
    /// Returns the purged entries; an empty result means the cart is valid.
    ///
    /// # Errors
    ///
    /// Returns a backend error when any step fails.
    #[instrument(skip_all, fields(%user))]
    pub async fn validate(&self, user: UserUuid) -> Result<RemovedEntries, CartError> {
        let rows = self.carts.list_cart_items(user).await?;

        if rows.is_empty() {
            self.write().insert(user, Vec::new());

            return Ok(RemovedEntries::new());
        }

        let ids: Vec<DesignUuid> = rows.iter().map(|row| row.design_uuid).collect();

        let available: FxHashSet<DesignUuid> = self
            .designs
            .get_statuses(ids)
            .await?
            .into_iter()
            .filter_map(|(uuid, status)| (status == DesignStatus::Available).then_some(uuid))
            .collect();

        let removed: RemovedEntries = rows
            .into_iter()
            .filter(|row| !available.contains(&row.design_uuid))
            .collect();

        if !removed.is_empty() {
            let stale: Vec<DesignUuid> = removed.iter().map(|row| row.design_uuid).collect();

            self.carts.delete_cart_items(user, stale).await?;

            info!(removed = removed.len(), "purged unavailable cart entries");
        }

        self.load(user).await?;

        Ok(removed)
    }

    fn read<T>(&self, user: UserUuid, f: impl FnOnce(&[CartEntry]) -> T) -> T {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        f(entries.get(&user).map_or(&[][..], Vec::as_slice))
    }

    fn write(&self) -> RwLockWriteGuard<'_, FxHashMap<UserUuid, Vec<CartEntry>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn retain(&self, user: UserUuid, keep: impl FnMut(&CartEntry) -> bool) {
        if let Some(entries) = self.write().get_mut(&user) {
            entries.retain(keep);
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::{
        domain::{carts::repository::MockCartRepository, designs::MockDesignsRepository},
        test::fixtures::{cart_row, design},
    };

    use super::*;

    #[tokio::test]
    async fn add_checks_status_then_inserts_and_resyncs() -> TestResult {
        let user = UserUuid::new();
        let rose = design("Rosa", "fineline", 100);
        let row = cart_row(rose.clone());

        let mut designs = MockDesignsRepository::new();
        designs
            .expect_get_status()
            .with(eq(rose.uuid))
            .times(1)
            .returning(|_| Ok(Some(DesignStatus::Available)));

        let mut carts = MockCartRepository::new();
        carts
            .expect_create_cart_item()
            .times(1)
            .returning(|_| Ok(()));
        carts
            .expect_list_cart_items()
            .with(eq(user))
            .times(1)
            .return_once(move |_| Ok(vec![row]));

        let store = CartStore::new(Arc::new(carts), Arc::new(designs));

        let outcome = store.add(user, rose.uuid).await?;

        assert_eq!(outcome, AddOutcome::Added);
        assert!(store.contains(user, rose.uuid));
        assert_eq!(store.total(user), Decimal::from(100));

        // Second add is rejected locally; the mocks would panic on a request.
        let again = store.add(user, rose.uuid).await;

        assert!(
            matches!(again, Err(CartError::AlreadyInCart)),
            "expected AlreadyInCart, got {again:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn removing_an_absent_design_succeeds() -> TestResult {
        let user = UserUuid::new();
        let absent = DesignUuid::new();

        let mut carts = MockCartRepository::new();
        carts
            .expect_delete_cart_item()
            .with(eq(user), eq(absent))
            .times(1)
            .returning(|_, _| Ok(()));
        carts
            .expect_list_cart_items()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let store = CartStore::new(Arc::new(carts), Arc::new(MockDesignsRepository::new()));

        store.remove(user, absent).await?;

        assert!(store.list(user).is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn remove_drops_the_entry_locally_when_resync_fails() -> TestResult {
        let user = UserUuid::new();
        let rose = design("Rosa", "fineline", 100);
        let moon = design("Lua", "blackwork", 80);
        let (rose_id, moon_id) = (rose.uuid, moon.uuid);
        let rows = vec![cart_row(rose), cart_row(moon)];

        let mut seq = mockall::Sequence::new();
        let mut carts = MockCartRepository::new();
        carts
            .expect_list_cart_items()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(move |_| Ok(rows));
        carts
            .expect_delete_cart_item()
            .with(eq(user), eq(rose_id))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        carts
            .expect_list_cart_items()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(BackendError::UnexpectedResponse("down".to_string())));

        let store = CartStore::new(Arc::new(carts), Arc::new(MockDesignsRepository::new()));

        store.load(user).await?;
        store.remove(user, rose_id).await?;

        assert!(!store.contains(user, rose_id));
        assert!(store.contains(user, moon_id));
        assert_eq!(store.total(user), Decimal::from(80));

        Ok(())
    }

    #[tokio::test]
    async fn add_of_unavailable_design_does_not_insert() {
        let user = UserUuid::new();

        let mut designs = MockDesignsRepository::new();
        designs
            .expect_get_status()
            .returning(|_| Ok(Some(DesignStatus::Sold)));

        let mut carts = MockCartRepository::new();
        carts.expect_create_cart_item().never();

        let store = CartStore::new(Arc::new(carts), Arc::new(designs));

        let result = store.add(user, DesignUuid::new()).await;

        assert!(
            matches!(result, Err(CartError::Unavailable)),
            "expected Unavailable, got {result:?}"
        );
        assert!(store.list(user).is_empty());
    }

    #[tokio::test]
    async fn add_of_unknown_design_is_unavailable() {
        let mut designs = MockDesignsRepository::new();
        designs.expect_get_status().returning(|_| Ok(None));

        let store = CartStore::new(Arc::new(MockCartRepository::new()), Arc::new(designs));

        let result = store.add(UserUuid::new(), DesignUuid::new()).await;

        assert!(
            matches!(result, Err(CartError::Unavailable)),
            "expected Unavailable, got {result:?}"
        );
    }

    #[tokio::test]
    async fn concurrent_add_from_another_session_is_idempotent() -> TestResult {
        let user = UserUuid::new();
        let rose = design("Rosa", "fineline", 100);
        let row = cart_row(rose.clone());

        let mut designs = MockDesignsRepository::new();
        designs
            .expect_get_status()
            .returning(|_| Ok(Some(DesignStatus::Available)));

        let mut carts = MockCartRepository::new();
        carts
            .expect_create_cart_item()
            .returning(|_| Err(BackendError::UniqueViolation));
        carts
            .expect_list_cart_items()
            .return_once(move |_| Ok(vec![row]));

        let store = CartStore::new(Arc::new(carts), Arc::new(designs));

        let outcome = store.add(user, rose.uuid).await?;

        assert_eq!(outcome, AddOutcome::AlreadyPresent);
        assert_eq!(store.list(user).len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn load_hides_stale_entries_without_deleting_them() -> TestResult {
        let user = UserUuid::new();
        let rose = design("Rosa", "fineline", 100);
        let mut moon = design("Lua", "blackwork", 80);
        moon.status = DesignStatus::Sold;
        moon.owner = Some(UserUuid::new());

        let rows = vec![cart_row(rose.clone()), cart_row(moon)];

        let mut carts = MockCartRepository::new();
        carts
            .expect_list_cart_items()
            .return_once(move |_| Ok(rows));
        carts.expect_delete_cart_items().never();

        let store = CartStore::new(Arc::new(carts), Arc::new(MockDesignsRepository::new()));

        let listed = store.load(user).await?;

        assert_eq!(listed.len(), 1);
        assert_eq!(listed.first().map(|e| e.design.uuid), Some(rose.uuid));

        Ok(())
    }

    #[tokio::test]
    async fn validate_purges_only_unavailable_entries() -> TestResult {
        let user = UserUuid::new();
        let rose = design("Rosa", "fineline", 100);
        let moon = design("Lua", "blackwork", 80);

        let stored = vec![cart_row(rose.clone()), cart_row(moon.clone())];
        let after = vec![cart_row(rose.clone())];

        let mut designs = MockDesignsRepository::new();
        let (rose_id, moon_id) = (rose.uuid, moon.uuid);
        designs
            .expect_get_statuses()
            .times(1)
            .returning(move |_| {
                Ok(vec![
                    (rose_id, DesignStatus::Available),
                    (moon_id, DesignStatus::Sold),
                ])
            });

        let mut carts = MockCartRepository::new();
        let mut lists = vec![after, stored];
        carts
            .expect_list_cart_items()
            .times(2)
            .returning(move |_| Ok(lists.pop().unwrap_or_default()));
        carts
            .expect_delete_cart_items()
            .with(eq(user), eq(vec![moon_id]))
            .times(1)
            .returning(|_, _| Ok(()));

        let store = CartStore::new(Arc::new(carts), Arc::new(designs));

        let removed = store.validate(user).await?;

        assert_eq!(removed.len(), 1);
        assert_eq!(removed.first().map(|row| row.design_uuid), Some(moon_id));
        assert!(store.contains(user, rose_id));
        assert!(!store.contains(user, moon_id));

        Ok(())
    }

    #[tokio::test]
    async fn failed_clear_keeps_cached_entries() -> TestResult {
        let user = UserUuid::new();
        let rose = design("Rosa", "fineline", 100);
        let rows = vec![cart_row(rose.clone())];

        let mut carts = MockCartRepository::new();
        carts
            .expect_list_cart_items()
            .return_once(move |_| Ok(rows));
        carts
            .expect_clear_cart_items()
            .returning(|_| Err(BackendError::UnexpectedResponse("down".to_string())));

        let store = CartStore::new(Arc::new(carts), Arc::new(MockDesignsRepository::new()));

        store.load(user).await?;

        let result = store.clear(user).await;

        assert!(result.is_err());
        assert!(store.contains(user, rose.uuid));

        Ok(())
    }
}
