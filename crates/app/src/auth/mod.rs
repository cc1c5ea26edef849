//! Authentication and the user directory.

mod errors;
mod models;
mod repository;
mod service;
mod token;

pub use errors::*;
pub use models::*;
pub use repository::{AuthRepository, MockAuthRepository, RestAuthRepository};
pub use service::*;
pub use token::*;
