//! Designs

pub mod catalog;
pub mod errors;
pub mod filters;
pub mod models;
pub mod repository;
pub mod visibility;

pub use catalog::{Catalog, DEFAULT_PAGE_SIZE};
pub use errors::CatalogError;
pub use filters::DesignFilter;
pub use models::{Design, DesignPage, DesignStatus, DesignUuid};
pub use repository::{DesignsRepository, MockDesignsRepository, RestDesignsRepository};
pub use visibility::{AssetVisibility, asset_visibility};
