//! Wishlist

pub mod errors;
pub mod models;
pub mod repository;
pub mod store;

pub use errors::WishlistError;
pub use models::{NewWishlistEntry, Toggled, WishlistRow};
pub use repository::{MockWishlistRepository, RestWishlistRepository, WishlistRepository};
pub use store::WishlistStore;
