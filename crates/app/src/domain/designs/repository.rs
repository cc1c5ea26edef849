//! Designs Repository

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use reqwest::{
    Method,
    header::{CONTENT_RANGE, RANGE},
};
use serde::{Deserialize, de::IgnoredAny};
use serde_json::json;

use crate::{
    auth::UserUuid,
    backend::{
        BackendError, PREFER_COUNT_EXACT, PREFER_RETURN_REPRESENTATION, PageRange,
        PostgrestClient, eq_filter, in_filter, parse_total,
    },
    domain::designs::models::{Design, DesignPage, DesignStatus, DesignUuid},
};

const DESIGNS_TABLE: &str = "tattoos";
const REPLENISH_RPC: &str = "replenish_tattoos";

/// Catalog persistence.
#[automock]
#[async_trait]
pub trait DesignsRepository: Send + Sync {
    /// Fetch a window of designs, newest first, with the total count.
    async fn list_designs(&self, range: PageRange) -> Result<DesignPage, BackendError>;

    /// Live status of one design, or `None` when it does not exist.
    async fn get_status(&self, design: DesignUuid) -> Result<Option<DesignStatus>, BackendError>;

    /// Live statuses of several designs in one query. Unknown ids are
    /// absent from the result.
    async fn get_statuses(
        &self,
        designs: Vec<DesignUuid>,
    ) -> Result<Vec<(DesignUuid, DesignStatus)>, BackendError>;

    /// Number of designs currently available.
    async fn count_available(&self) -> Result<u64, BackendError>;

    /// Conditionally mark a design sold to `owner`, only while it is still
    /// available. Returns the number of rows changed (0 or 1).
    async fn mark_sold(
        &self,
        design: DesignUuid,
        owner: UserUuid,
        at: Timestamp,
    ) -> Result<u64, BackendError>;

    /// Ask the backend to generate new designs.
    async fn replenish(&self) -> Result<Vec<Design>, BackendError>;

    /// Every sold design, for reconciliation.
    async fn list_sold(&self) -> Result<Vec<Design>, BackendError>;
}

/// `tattoos` table access over REST.
#[derive(Debug, Clone)]
pub struct RestDesignsRepository {
    client: PostgrestClient,
}

impl RestDesignsRepository {
    #[must_use]
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct StatusRow {
    id: DesignUuid,
    status: DesignStatus,
}

#[async_trait]
impl DesignsRepository for RestDesignsRepository {
    async fn list_designs(&self, range: PageRange) -> Result<DesignPage, BackendError> {
        let request = self
            .client
            .table(Method::GET, DESIGNS_TABLE)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .header("Range-Unit", "items")
            .header(RANGE, range.header_value())
            .header("Prefer", PREFER_COUNT_EXACT);

        let response = self.client.send(request).await?;

        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_total);

        let designs = response.json().await?;

        Ok(DesignPage { designs, total })
    }

    async fn get_status(&self, design: DesignUuid) -> Result<Option<DesignStatus>, BackendError> {
        let request = self
            .client
            .table(Method::GET, DESIGNS_TABLE)
            .query(&[("select", "id,status".to_string()), ("id", eq_filter(design))]);

        let rows: Vec<StatusRow> = self.client.fetch(request).await?;

        Ok(rows.into_iter().next().map(|row| row.status))
    }

    async fn get_statuses(
        &self,
        designs: Vec<DesignUuid>,
    ) -> Result<Vec<(DesignUuid, DesignStatus)>, BackendError> {
        if designs.is_empty() {
            return Ok(Vec::new());
        }

        let request = self
            .client
            .table(Method::GET, DESIGNS_TABLE)
            .query(&[("select", "id,status".to_string()), ("id", in_filter(designs))]);

        let rows: Vec<StatusRow> = self.client.fetch(request).await?;

        Ok(rows.into_iter().map(|row| (row.id, row.status)).collect())
    }

    async fn count_available(&self) -> Result<u64, BackendError> {
        let request = self
            .client
            .table(Method::HEAD, DESIGNS_TABLE)
            .query(&[
                ("select", "id".to_string()),
                ("status", eq_filter(DesignStatus::Available.as_str())),
            ])
            .header("Prefer", PREFER_COUNT_EXACT);

        let response = self.client.send(request).await?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_total)
            .ok_or_else(|| {
                BackendError::UnexpectedResponse("count response had no total".to_string())
            })
    }

    async fn mark_sold(
        &self,
        design: DesignUuid,
        owner: UserUuid,
        at: Timestamp,
    ) -> Result<u64, BackendError> {
        let request = self
            .client
            .table(Method::PATCH, DESIGNS_TABLE)
            .query(&[
                ("id", eq_filter(design)),
                ("status", eq_filter(DesignStatus::Available.as_str())),
            ])
            .header("Prefer", PREFER_RETURN_REPRESENTATION)
            .json(&json!({
                "status": DesignStatus::Sold,
                "sold_to_user_id": owner,
                "updated_at": at,
            }));

        let rows: Vec<IgnoredAny> = self.client.fetch(request).await?;

        Ok(rows.len() as u64)
    }

    async fn replenish(&self) -> Result<Vec<Design>, BackendError> {
        let request = self.client.rpc(REPLENISH_RPC).json(&json!({}));

        let created: Option<Vec<Design>> = self.client.fetch(request).await?;

        Ok(created.unwrap_or_default())
    }

    async fn list_sold(&self) -> Result<Vec<Design>, BackendError> {
        let request = self.client.table(Method::GET, DESIGNS_TABLE).query(&[
            ("select", "*".to_string()),
            ("status", eq_filter(DesignStatus::Sold.as_str())),
            ("order", "updated_at.desc".to_string()),
        ]);

        self.client.fetch(request).await
    }
}
