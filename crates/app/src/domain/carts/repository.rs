//! Cart Items Repository

use async_trait::async_trait;
use mockall::automock;
use reqwest::Method;

use crate::{
    auth::UserUuid,
    backend::{BackendError, PREFER_RETURN_MINIMAL, PostgrestClient, eq_filter, in_filter},
    domain::{
        carts::models::{CartRow, NewCartEntry},
        designs::DesignUuid,
    },
};

const CART_ITEMS_TABLE: &str = "cart_items";
const CART_SELECT: &str = "id,tattoo_id,tattoos(*)";

#[automock]
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Every stored row for the user, stale ones included.
    async fn list_cart_items(&self, user: UserUuid) -> Result<Vec<CartRow>, BackendError>;

    /// Insert one entry. A duplicate (user, design) pair is a
    /// [`BackendError::UniqueViolation`].
    async fn create_cart_item(&self, entry: NewCartEntry) -> Result<(), BackendError>;

    /// Delete the user's entry for one design. Deleting nothing is not an error.
    async fn delete_cart_item(&self, user: UserUuid, design: DesignUuid)
    -> Result<(), BackendError>;

    async fn delete_cart_items(
        &self,
        user: UserUuid,
        designs: Vec<DesignUuid>,
    ) -> Result<(), BackendError>;

    async fn clear_cart_items(&self, user: UserUuid) -> Result<(), BackendError>;
}

#[derive(Debug, Clone)]
pub struct RestCartRepository {
    client: PostgrestClient,
}

impl RestCartRepository {
    #[must_use]
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CartRepository for RestCartRepository {
    async fn list_cart_items(&self, user: UserUuid) -> Result<Vec<CartRow>, BackendError> {
        let request = self
            .client
            .table(Method::GET, CART_ITEMS_TABLE)
            .query(&[("select", CART_SELECT.to_string()), ("user_id", eq_filter(user))]);

        self.client.fetch(request).await
    }

    async fn create_cart_item(&self, entry: NewCartEntry) -> Result<(), BackendError> {
        let request = self
            .client
            .table(Method::POST, CART_ITEMS_TABLE)
            .header("Prefer", PREFER_RETURN_MINIMAL)
            .json(&entry);

        self.client.execute(request).await
    }

    async fn delete_cart_item(
        &self,
        user: UserUuid,
        design: DesignUuid,
    ) -> Result<(), BackendError> {
        let request = self
            .client
            .table(Method::DELETE, CART_ITEMS_TABLE)
            .query(&[("user_id", eq_filter(user)), ("tattoo_id", eq_filter(design))]);

        self.client.execute(request).await
    }

    async fn delete_cart_items(
        &self,
        user: UserUuid,
        designs: Vec<DesignUuid>,
    ) -> Result<(), BackendError> {
        if designs.is_empty() {
            return Ok(());
        }

        let request = self
            .client
            .table(Method::DELETE, CART_ITEMS_TABLE)
            .query(&[("user_id", eq_filter(user)), ("tattoo_id", in_filter(designs))]);

        self.client.execute(request).await
    }

    async fn clear_cart_items(&self, user: UserUuid) -> Result<(), BackendError> {
        let request = self
            .client
            .table(Method::DELETE, CART_ITEMS_TABLE)
            .query(&[("user_id", eq_filter(user))]);

        self.client.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn decodes_rows_with_and_without_a_joined_design() -> TestResult {
        let body = r#"[
            {
                "id": "0191e7b4-8c4e-7a52-9a0e-3c5d2f1b6a01",
                "tattoo_id": "0191e7b4-8c4e-7a52-9a0e-3c5d2f1b6a77",
                "tattoos": {
                    "id": "0191e7b4-8c4e-7a52-9a0e-3c5d2f1b6a77",
                    "title": "Serpente",
                    "style": "fineline",
                    "image_url": "https://cdn.example.com/serpente.png",
                    "price": 100,
                    "status": "disponível",
                    "created_at": "2024-05-01T10:00:00Z",
                    "updated_at": "2024-05-01T10:00:00Z"
                }
            },
            {
                "id": "0191e7b4-8c4e-7a52-9a0e-3c5d2f1b6a02",
                "tattoo_id": "0191e7b4-8c4e-7a52-9a0e-3c5d2f1b6a78",
                "tattoos": null
            }
        ]"#;

        let rows: Vec<CartRow> = serde_json::from_str(body)?;

        let [listed, orphan] = rows.as_slice() else {
            return Err("expected two rows".into());
        };

        assert_eq!(listed.label(), "Serpente");
        assert!(listed.clone().into_available_entry().is_some());
        assert!(orphan.design.is_none());
        assert!(orphan.clone().into_available_entry().is_none());
        assert_eq!(orphan.label(), "0191e7b4-8c4e-7a52-9a0e-3c5d2f1b6a78");

        Ok(())
    }
}
