//! Wishlist Models

use serde::{Deserialize, Serialize};

use crate::{
    auth::UserUuid,
    domain::designs::{Design, DesignUuid},
};

/// A stored wishlist row with its joined design.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WishlistRow {
    #[serde(rename = "tattoo_id")]
    pub design_uuid: DesignUuid,

    #[serde(rename = "tattoos", default)]
    pub design: Option<Design>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewWishlistEntry {
    #[serde(rename = "user_id")]
    pub user: UserUuid,

    #[serde(rename = "tattoo_id")]
    pub design: DesignUuid,
}

/// Whether a toggle left the design wishlisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}
