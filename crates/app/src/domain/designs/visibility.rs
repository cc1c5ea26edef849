//! Which rendering of a design's artwork a viewer may see.

use crate::{auth::UserUuid, domain::designs::models::Design};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetVisibility {
    /// The unmarked original, shown only to the owner.
    Original,

    /// The watermarked rendering.
    Protected,
}

#[must_use]
pub fn asset_visibility(viewer: Option<UserUuid>, owner: Option<UserUuid>) -> AssetVisibility {
    match (viewer, owner) {
        (Some(viewer), Some(owner)) if viewer == owner => AssetVisibility::Original,
        _ => AssetVisibility::Protected,
    }
}

impl Design {
    #[must_use]
    pub fn visibility_for(&self, viewer: Option<UserUuid>) -> AssetVisibility {
        asset_visibility(viewer, self.owner)
    }
}
