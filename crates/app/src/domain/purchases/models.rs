//! Purchase Models

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    auth::UserUuid,
    domain::{
        carts::CartEntry,
        designs::{Design, DesignUuid},
    },
    errors::FailureKind,
};

/// Proof of ownership written after a design is marked sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPurchase {
    #[serde(rename = "user_id")]
    pub user: UserUuid,

    #[serde(rename = "tattoo_id")]
    pub design: DesignUuid,

    pub purchase_date: Timestamp,
    pub certificate_url: String,
}

/// A stored purchase with its joined design.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PurchaseRecord {
    #[serde(rename = "user_id")]
    pub user: UserUuid,

    #[serde(rename = "tattoo_id")]
    pub design_uuid: DesignUuid,

    pub purchase_date: Timestamp,
    pub certificate_url: String,

    #[serde(rename = "tattoos", default)]
    pub design: Option<Design>,
}

/// What happened to the catalog after a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replenishment {
    /// Enough designs were still available.
    NotNeeded { available: u64 },

    /// The pool was below the floor and the backend generated more.
    Replenished { available: u64, created: usize },

    /// The check or the generation failed; the sale still stands.
    Failed(FailureKind),
}

/// Catalog follow-up run after a sale. Failures here never undo the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowUp {
    /// Kind of the last failed catalog refresh, if any.
    pub refresh_error: Option<FailureKind>,
    pub replenishment: Replenishment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub design: DesignUuid,
    pub certificate_url: String,
    pub follow_up: FollowUp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    pub entries: Vec<CartEntry>,
    pub total: Decimal,

    /// Set when the purchase went through but the cart could not be emptied.
    pub cart_clear_error: Option<FailureKind>,
    pub follow_up: FollowUp,
}
