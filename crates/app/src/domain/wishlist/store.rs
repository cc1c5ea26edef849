//! Wishlist store.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::{
    auth::UserUuid,
    backend::BackendError,
    domain::{
        designs::{Design, DesignUuid},
        wishlist::{
            errors::WishlistError,
            models::{NewWishlistEntry, Toggled},
            repository::WishlistRepository,
        },
    },
};

#[derive(Debug, Default)]
struct Favourites {
    ids: FxHashSet<DesignUuid>,
    designs: Vec<Design>,
}

/// Per-user set of favourite designs.
pub struct WishlistStore {
    repository: Arc<dyn WishlistRepository>,
    favourites: RwLock<FxHashMap<UserUuid, Favourites>>,
}

impl fmt::Debug for WishlistStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WishlistStore").finish_non_exhaustive()
    }
}

impl WishlistStore {
    #[must_use]
    pub fn new(repository: Arc<dyn WishlistRepository>) -> Self {
        Self {
            repository,
            favourites: RwLock::default(),
        }
    }

    /// Reload the user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the wishlist cannot be read.
    pub async fn refresh(&self, user: UserUuid) -> Result<(), WishlistError> {
        let rows = self.repository.list_wishlist(user).await?;

        let favourites = Favourites {
            ids: rows.iter().map(|row| row.design_uuid).collect(),
            designs: rows.into_iter().filter_map(|row| row.design).collect(),
        };

        self.favourites
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user, favourites);

        Ok(())
    }

    /// # Errors
    ///
    /// Returns a backend error when the insert or the reload fails. A
    /// design that is already wishlisted is not an error.
    pub async fn add(&self, user: UserUuid, design: DesignUuid) -> Result<(), WishlistError> {
        match self
            .repository
            .create_wishlist_entry(NewWishlistEntry { user, design })
            .await
        {
            Ok(()) => {}
            Err(BackendError::UniqueViolation) => debug!(%design, "design already wishlisted"),
            Err(error) => return Err(error.into()),
        }

        self.refresh(user).await
    }

    /// # Errors
    ///
    /// Returns a backend error when the delete or the reload fails.
    pub async fn remove(&self, user: UserUuid, design: DesignUuid) -> Result<(), WishlistError> {
        self.repository.delete_wishlist_entry(user, design).await?;

        self.refresh(user).await
    }

    /// Add the design when absent, remove it when present.
    ///
    /// # Errors
    ///
    /// See [`WishlistStore::add`] and [`WishlistStore::remove`].
    pub async fn toggle(
        &self,
        user: UserUuid,
        design: DesignUuid,
    ) -> Result<Toggled, WishlistError> {
        if self.contains(user, design) {
            self.remove(user, design).await?;

            Ok(Toggled::Removed)
        } else {
            self.add(user, design).await?;

            Ok(Toggled::Added)
        }
    }

    #[must_use]
    pub fn contains(&self, user: UserUuid, design: DesignUuid) -> bool {
        self.favourites
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user)
            .is_some_and(|favourites| favourites.ids.contains(&design))
    }

    /// Wishlisted designs from the last refresh.
    #[must_use]
    pub fn designs(&self, user: UserUuid) -> Vec<Design> {
        self.favourites
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user)
            .map(|favourites| favourites.designs.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::wishlist::{models::WishlistRow, repository::MockWishlistRepository},
        test::fixtures::design,
    };

    use super::*;

    fn row(design: &Design) -> WishlistRow {
        WishlistRow {
            design_uuid: design.uuid,
            design: Some(design.clone()),
        }
    }

    #[tokio::test]
    async fn toggle_adds_then_removes() -> TestResult {
        let user = UserUuid::new();
        let rose = design("Rosa", "fineline", 100);

        let mut repository = MockWishlistRepository::new();
        repository
            .expect_create_wishlist_entry()
            .times(1)
            .returning(|_| Ok(()));
        repository
            .expect_delete_wishlist_entry()
            .times(1)
            .returning(|_, _| Ok(()));

        let mut lists = vec![Vec::new(), vec![row(&rose)]];
        repository
            .expect_list_wishlist()
            .times(2)
            .returning(move |_| Ok(lists.pop().unwrap_or_default()));

        let store = WishlistStore::new(Arc::new(repository));

        assert_eq!(store.toggle(user, rose.uuid).await?, Toggled::Added);
        assert!(store.contains(user, rose.uuid));
        assert_eq!(store.designs(user).len(), 1);

        assert_eq!(store.toggle(user, rose.uuid).await?, Toggled::Removed);
        assert!(!store.contains(user, rose.uuid));

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_add_is_not_an_error() -> TestResult {
        let user = UserUuid::new();
        let rose = design("Rosa", "fineline", 100);
        let rows = vec![row(&rose)];

        let mut repository = MockWishlistRepository::new();
        repository
            .expect_create_wishlist_entry()
            .returning(|_| Err(BackendError::UniqueViolation));
        repository
            .expect_list_wishlist()
            .return_once(move |_| Ok(rows));

        let store = WishlistStore::new(Arc::new(repository));

        store.add(user, rose.uuid).await?;

        assert!(store.contains(user, rose.uuid));

        Ok(())
    }

    #[tokio::test]
    async fn wishlists_are_kept_per_user() -> TestResult {
        let (alice, bob) = (UserUuid::new(), UserUuid::new());
        let rose = design("Rosa", "fineline", 100);
        let rows = vec![row(&rose)];

        let mut repository = MockWishlistRepository::new();
        repository
            .expect_list_wishlist()
            .return_once(move |_| Ok(rows));

        let store = WishlistStore::new(Arc::new(repository));

        store.refresh(alice).await?;

        assert!(store.contains(alice, rose.uuid));
        assert!(!store.contains(bob, rose.uuid));
        assert!(store.designs(bob).is_empty());

        Ok(())
    }
}
