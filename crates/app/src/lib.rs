//! Client library for an exclusive tattoo design marketplace.

pub mod auth;
pub mod backend;
pub mod context;
pub mod domain;
pub mod errors;

#[cfg(test)]
mod test;

mod uuids;

pub use errors::FailureKind;
