//! Points Repository

use async_trait::async_trait;
use mockall::automock;
use reqwest::Method;
use serde::{Deserialize, de::IgnoredAny};
use serde_json::json;

use crate::{
    auth::UserUuid,
    backend::{BackendError, PREFER_RETURN_MINIMAL, PostgrestClient, eq_filter, in_filter},
    domain::points::models::{
        NewRedemption, PointsRow, SpinIntent, SpinIntentUpdate, SpinIntentUuid, SpinState,
    },
};

const USERS_TABLE: &str = "users";
const POINTS_TABLE: &str = "inkpoints_usuario";
const REDEMPTIONS_TABLE: &str = "recompensas_resgatadas";
const SPIN_INTENTS_TABLE: &str = "spin_intents";
const ADJUST_POINTS_RPC: &str = "update_user_points";

/// Ledger persistence. Balances only change through
/// [`PointsRepository::adjust_points`].
#[automock]
#[async_trait]
pub trait PointsRepository: Send + Sync {
    /// Whether the user has a directory profile.
    async fn user_exists(&self, user: UserUuid) -> Result<bool, BackendError>;

    async fn get_points(&self, user: UserUuid) -> Result<Option<i64>, BackendError>;

    /// Create the user's row at zero. An existing row is a
    /// [`BackendError::UniqueViolation`].
    async fn create_points(&self, user: UserUuid) -> Result<(), BackendError>;

    /// Atomically add a signed delta. The backend rejects results below zero.
    async fn adjust_points(&self, user: UserUuid, delta: i64) -> Result<(), BackendError>;

    async fn record_redemption(&self, redemption: NewRedemption) -> Result<(), BackendError>;

    async fn create_spin_intent(&self, intent: SpinIntent) -> Result<(), BackendError>;

    async fn update_spin_intent(
        &self,
        intent: SpinIntentUuid,
        update: SpinIntentUpdate,
    ) -> Result<(), BackendError>;

    /// Intents not yet settled or cancelled, oldest first.
    async fn list_unsettled_spin_intents(&self) -> Result<Vec<SpinIntent>, BackendError>;
}

#[derive(Debug, Clone)]
pub struct RestPointsRepository {
    client: PostgrestClient,
}

impl RestPointsRepository {
    #[must_use]
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct BalanceRow {
    #[serde(rename = "pontos")]
    points: i64,
}

#[async_trait]
impl PointsRepository for RestPointsRepository {
    async fn user_exists(&self, user: UserUuid) -> Result<bool, BackendError> {
        let request = self
            .client
            .table(Method::GET, USERS_TABLE)
            .query(&[("select", "id".to_string()), ("id", eq_filter(user))]);

        let rows: Vec<IgnoredAny> = self.client.fetch(request).await?;

        Ok(!rows.is_empty())
    }

    async fn get_points(&self, user: UserUuid) -> Result<Option<i64>, BackendError> {
        let request = self
            .client
            .table(Method::GET, POINTS_TABLE)
            .query(&[("select", "pontos".to_string()), ("id_usuario", eq_filter(user))]);

        let rows: Vec<BalanceRow> = self.client.fetch(request).await?;

        Ok(rows.into_iter().next().map(|row| row.points))
    }

    async fn create_points(&self, user: UserUuid) -> Result<(), BackendError> {
        let request = self
            .client
            .table(Method::POST, POINTS_TABLE)
            .header("Prefer", PREFER_RETURN_MINIMAL)
            .json(&PointsRow { user, points: 0 });

        self.client.execute(request).await
    }

    async fn adjust_points(&self, user: UserUuid, delta: i64) -> Result<(), BackendError> {
        let request = self
            .client
            .rpc(ADJUST_POINTS_RPC)
            .json(&json!({ "user_id": user, "points_to_add": delta }));

        self.client.execute(request).await
    }

    async fn record_redemption(&self, redemption: NewRedemption) -> Result<(), BackendError> {
        let request = self
            .client
            .table(Method::POST, REDEMPTIONS_TABLE)
            .header("Prefer", PREFER_RETURN_MINIMAL)
            .json(&redemption);

        self.client.execute(request).await
    }

    async fn create_spin_intent(&self, intent: SpinIntent) -> Result<(), BackendError> {
        let request = self
            .client
            .table(Method::POST, SPIN_INTENTS_TABLE)
            .header("Prefer", PREFER_RETURN_MINIMAL)
            .json(&intent);

        self.client.execute(request).await
    }

    async fn update_spin_intent(
        &self,
        intent: SpinIntentUuid,
        update: SpinIntentUpdate,
    ) -> Result<(), BackendError> {
        let request = self
            .client
            .table(Method::PATCH, SPIN_INTENTS_TABLE)
            .query(&[("id", eq_filter(intent))])
            .header("Prefer", PREFER_RETURN_MINIMAL)
            .json(&update);

        self.client.execute(request).await
    }

    async fn list_unsettled_spin_intents(&self) -> Result<Vec<SpinIntent>, BackendError> {
        let open = [SpinState::Pending, SpinState::Debited, SpinState::Awarded]
            .map(SpinState::as_str);

        let request = self.client.table(Method::GET, SPIN_INTENTS_TABLE).query(&[
            ("select", "*".to_string()),
            ("state", in_filter(open)),
            ("order", "created_at.asc".to_string()),
        ]);

        self.client.fetch(request).await
    }
}
