//! Wishlist Repository

use async_trait::async_trait;
use mockall::automock;
use reqwest::Method;

use crate::{
    auth::UserUuid,
    backend::{BackendError, PREFER_RETURN_MINIMAL, PostgrestClient, eq_filter},
    domain::{
        designs::DesignUuid,
        wishlist::models::{NewWishlistEntry, WishlistRow},
    },
};

const WISHLIST_TABLE: &str = "wishlist";

#[automock]
#[async_trait]
pub trait WishlistRepository: Send + Sync {
    async fn list_wishlist(&self, user: UserUuid) -> Result<Vec<WishlistRow>, BackendError>;

    async fn create_wishlist_entry(&self, entry: NewWishlistEntry) -> Result<(), BackendError>;

    async fn delete_wishlist_entry(
        &self,
        user: UserUuid,
        design: DesignUuid,
    ) -> Result<(), BackendError>;
}

#[derive(Debug, Clone)]
pub struct RestWishlistRepository {
    client: PostgrestClient,
}

impl RestWishlistRepository {
    #[must_use]
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WishlistRepository for RestWishlistRepository {
    async fn list_wishlist(&self, user: UserUuid) -> Result<Vec<WishlistRow>, BackendError> {
        let request = self.client.table(Method::GET, WISHLIST_TABLE).query(&[
            ("select", "tattoo_id,tattoos(*)".to_string()),
            ("user_id", eq_filter(user)),
        ]);

        self.client.fetch(request).await
    }

    async fn create_wishlist_entry(&self, entry: NewWishlistEntry) -> Result<(), BackendError> {
        let request = self
            .client
            .table(Method::POST, WISHLIST_TABLE)
            .header("Prefer", PREFER_RETURN_MINIMAL)
            .json(&entry);

        self.client.execute(request).await
    }

    async fn delete_wishlist_entry(
        &self,
        user: UserUuid,
        design: DesignUuid,
    ) -> Result<(), BackendError> {
        let request = self
            .client
            .table(Method::DELETE, WISHLIST_TABLE)
            .query(&[("user_id", eq_filter(user)), ("tattoo_id", eq_filter(design))]);

        self.client.execute(request).await
    }
}
