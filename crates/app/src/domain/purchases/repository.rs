//! Purchases Repository

use async_trait::async_trait;
use mockall::automock;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::UserUuid,
    backend::{BackendError, PREFER_RETURN_MINIMAL, PostgrestClient, eq_filter, in_filter},
    domain::{
        designs::DesignUuid,
        purchases::models::{NewPurchase, PurchaseRecord},
    },
};

const PURCHASES_TABLE: &str = "purchased_tattoos";
const PURCHASE_CART_RPC: &str = "purchase_cart";

#[automock]
#[async_trait]
pub trait PurchasesRepository: Send + Sync {
    async fn create_purchase(&self, purchase: NewPurchase) -> Result<(), BackendError>;

    async fn list_purchases(&self, user: UserUuid) -> Result<Vec<PurchaseRecord>, BackendError>;

    /// Which of the given designs already have a purchase record.
    async fn find_purchased(
        &self,
        designs: Vec<DesignUuid>,
    ) -> Result<Vec<DesignUuid>, BackendError>;

    /// Buy every design in the user's cart as one unit. Any error means
    /// nothing was bought.
    async fn purchase_cart(&self, user: UserUuid) -> Result<(), BackendError>;
}

#[derive(Debug, Clone)]
pub struct RestPurchasesRepository {
    client: PostgrestClient,
}

impl RestPurchasesRepository {
    #[must_use]
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct PurchasedRow {
    tattoo_id: DesignUuid,
}

#[async_trait]
impl PurchasesRepository for RestPurchasesRepository {
    async fn create_purchase(&self, purchase: NewPurchase) -> Result<(), BackendError> {
        let request = self
            .client
            .table(Method::POST, PURCHASES_TABLE)
            .header("Prefer", PREFER_RETURN_MINIMAL)
            .json(&purchase);

        self.client.execute(request).await
    }

    async fn list_purchases(&self, user: UserUuid) -> Result<Vec<PurchaseRecord>, BackendError> {
        let request = self.client.table(Method::GET, PURCHASES_TABLE).query(&[
            ("select", "*,tattoos(*)".to_string()),
            ("user_id", eq_filter(user)),
            ("order", "purchase_date.desc".to_string()),
        ]);

        self.client.fetch(request).await
    }

    async fn find_purchased(
        &self,
        designs: Vec<DesignUuid>,
    ) -> Result<Vec<DesignUuid>, BackendError> {
        if designs.is_empty() {
            return Ok(Vec::new());
        }

        let request = self.client.table(Method::GET, PURCHASES_TABLE).query(&[
            ("select", "tattoo_id".to_string()),
            ("tattoo_id", in_filter(designs)),
        ]);

        let rows: Vec<PurchasedRow> = self.client.fetch(request).await?;

        Ok(rows.into_iter().map(|row| row.tattoo_id).collect())
    }

    async fn purchase_cart(&self, user: UserUuid) -> Result<(), BackendError> {
        let request = self
            .client
            .rpc(PURCHASE_CART_RPC)
            .json(&json!({ "p_user_id": user }));

        self.client.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn new_purchase_uses_backend_column_names() -> TestResult {
        let purchase = NewPurchase {
            user: UserUuid::new(),
            design: DesignUuid::new(),
            purchase_date: Timestamp::UNIX_EPOCH,
            certificate_url: "https://example.co/c.pdf".to_string(),
        };

        let value = serde_json::to_value(&purchase)?;

        assert!(value.get("user_id").is_some());
        assert!(value.get("tattoo_id").is_some());
        assert_eq!(
            value.get("purchase_date").and_then(|v| v.as_str()),
            Some("1970-01-01T00:00:00Z")
        );

        Ok(())
    }
}
