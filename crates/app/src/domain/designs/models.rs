//! Design Models

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{auth::UserUuid, uuids::TypedUuid};

/// Design UUID
pub type DesignUuid = TypedUuid<Design>;

/// Sale state of a design. The wire values are the backend's column values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DesignStatus {
    #[serde(rename = "disponível")]
    Available,

    #[serde(rename = "vendida")]
    Sold,

    #[serde(rename = "reservada")]
    Reserved,
}

impl DesignStatus {
    /// Column value used in query filters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "disponível",
            Self::Sold => "vendida",
            Self::Reserved => "reservada",
        }
    }
}

/// A one-off catalog artwork.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    #[serde(rename = "id")]
    pub uuid: DesignUuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub style: String,
    pub price: Decimal,
    pub status: DesignStatus,
    pub image_url: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(rename = "sold_to_user_id", default)]
    pub owner: Option<UserUuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Design {
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == DesignStatus::Available
    }

    /// Whether status and owner agree: sold designs have an owner and
    /// available ones do not. Reserved designs may be either.
    #[must_use]
    pub fn has_consistent_ownership(&self) -> bool {
        match self.status {
            DesignStatus::Sold => self.owner.is_some(),
            DesignStatus::Available => self.owner.is_none(),
            DesignStatus::Reserved => true,
        }
    }
}

/// One page of designs plus the backend's total row count.
#[derive(Debug, Clone, Default)]
pub struct DesignPage {
    pub designs: Vec<Design>,
    pub total: Option<u64>,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn decodes_a_backend_row() -> TestResult {
        let body = r#"{
            "id": "0191e7b4-8c4e-7a52-9a0e-3c5d2f1b6a77",
            "title": "Serpente",
            "description": "Fine line snake",
            "image_url": "https://cdn.example.com/serpente.png",
            "preview_url": null,
            "price": 100,
            "status": "disponível",
            "created_at": "2024-05-01T10:00:00+00:00",
            "sold_to_user_id": null,
            "updated_at": "2024-05-01T10:00:00+00:00",
            "style": "fineline"
        }"#;

        let design: Design = serde_json::from_str(body)?;

        assert_eq!(design.title, "Serpente");
        assert_eq!(design.price, Decimal::from(100));
        assert!(design.is_available());
        assert!(design.has_consistent_ownership());

        Ok(())
    }

    #[test]
    fn sold_without_owner_is_inconsistent() -> TestResult {
        let body = r#"{
            "id": "0191e7b4-8c4e-7a52-9a0e-3c5d2f1b6a77",
            "title": "Lua",
            "style": "blackwork",
            "image_url": "https://cdn.example.com/lua.png",
            "price": "149.90",
            "status": "vendida",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-02T10:00:00Z"
        }"#;

        let design: Design = serde_json::from_str(body)?;

        assert_eq!(design.status, DesignStatus::Sold);
        assert!(!design.has_consistent_ownership());

        Ok(())
    }
}
