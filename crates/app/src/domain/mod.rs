//! Marketplace Domain Concerns

pub mod carts;
pub mod designs;
pub mod points;
pub mod purchases;
pub mod wishlist;
