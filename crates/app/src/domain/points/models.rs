//! Points Models

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{auth::UserUuid, uuids::TypedUuid};

/// Spin Intent UUID
pub type SpinIntentUuid = TypedUuid<SpinIntent>;

/// A user's points row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsRow {
    #[serde(rename = "id_usuario")]
    pub user: UserUuid,

    #[serde(rename = "pontos")]
    pub points: i64,
}

/// A redeemed reward, as recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRedemption {
    #[serde(rename = "id_usuario")]
    pub user: UserUuid,

    #[serde(rename = "recompensa")]
    pub reward: String,

    #[serde(rename = "pontos_gastos")]
    pub cost: i64,
}

/// Progress of one wheel spin. Each state is written before the side
/// effect that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpinState {
    /// Recorded; the stake may or may not have been taken.
    Pending,

    /// The stake was taken; no outcome recorded yet.
    Debited,

    /// The outcome was recorded; its credit may not have been applied.
    Awarded,

    Settled,

    Cancelled,
}

impl SpinState {
    /// Column value used in query filters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Debited => "debited",
            Self::Awarded => "awarded",
            Self::Settled => "settled",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Settled | Self::Cancelled)
    }
}

/// Journal row for one wheel spin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinIntent {
    #[serde(rename = "id")]
    pub uuid: SpinIntentUuid,

    #[serde(rename = "user_id")]
    pub user: UserUuid,

    pub stake: i64,
    pub state: SpinState,

    /// Points to credit, once the outcome is known.
    #[serde(default)]
    pub reward: Option<i64>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SpinIntent {
    #[must_use]
    pub fn new(user: UserUuid, stake: i64, at: Timestamp) -> Self {
        Self {
            uuid: SpinIntentUuid::new(),
            user,
            stake,
            state: SpinState::Pending,
            reward: None,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Partial update of a spin intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpinIntentUpdate {
    pub state: SpinState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<i64>,

    pub updated_at: Timestamp,
}

impl SpinIntentUpdate {
    #[must_use]
    pub fn to(state: SpinState) -> Self {
        Self {
            state,
            reward: None,
            updated_at: Timestamp::now(),
        }
    }

    #[must_use]
    pub fn with_reward(mut self, reward: i64) -> Self {
        self.reward = Some(reward);
        self
    }
}
