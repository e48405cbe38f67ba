//! The `services` module provides a high-level API for interacting with the database.
//! It encapsulates the data access patterns so that HTTP handlers work with domain
//! operations rather than queries.
//!
//! - `user_service`: user identity records and password hashing/verification.
//! - `token_service`: opaque bearer tokens bound to users.
//! - `owned_resource_service`: per-owner Tag/Ingredient storage.

pub mod owned_resource_service;
pub mod token_service;
pub mod user_service;
pub mod validation;

pub use owned_resource_service::*;
pub use token_service::*;
pub use user_service::*;
