//! Cart Models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    auth::UserUuid,
    domain::designs::{Design, DesignUuid},
    uuids::TypedUuid,
};

/// Cart Entry UUID
pub type CartEntryUuid = TypedUuid<CartEntry>;

/// A cart row as stored, with the joined design when it still exists.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CartRow {
    #[serde(rename = "id")]
    pub uuid: CartEntryUuid,

    #[serde(rename = "tattoo_id")]
    pub design_uuid: DesignUuid,

    #[serde(rename = "tattoos", default)]
    pub design: Option<Design>,
}

impl CartRow {
    /// The row as a listable entry, when its design is still for sale.
    #[must_use]
    pub fn into_available_entry(self) -> Option<CartEntry> {
        self.design
            .filter(Design::is_available)
            .map(|design| CartEntry {
                uuid: self.uuid,
                design,
            })
    }

    /// Title for messages, falling back to the design id.
    #[must_use]
    pub fn label(&self) -> String {
        self.design
            .as_ref()
            .map_or_else(|| self.design_uuid.to_string(), |design| design.title.clone())
    }
}

/// CartEntry Model
#[derive(Debug, Clone, PartialEq)]
pub struct CartEntry {
    pub uuid: CartEntryUuid,
    pub design: Design,
}

/// NewCartEntry Model
#[derive(Debug, Clone, Serialize)]
pub struct NewCartEntry {
    #[serde(rename = "user_id")]
    pub user: UserUuid,

    #[serde(rename = "tattoo_id")]
    pub design: DesignUuid,
}

/// Result of a successful add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,

    /// Another session added the same design first.
    AlreadyPresent,
}

/// Sum of the listed entries' prices.
#[must_use]
pub fn total(entries: &[CartEntry]) -> Decimal {
    entries.iter().map(|entry| entry.design.price).sum()
}
