//! Carts

pub mod errors;
pub mod models;
pub mod repository;
pub mod store;

pub use errors::CartError;
pub use models::{AddOutcome, CartEntry, CartEntryUuid, CartRow, NewCartEntry};
pub use repository::{CartRepository, MockCartRepository, RestCartRepository};
pub use store::{CartStore, RemovedEntries};
