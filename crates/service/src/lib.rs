//! Service layer for the marketplace: business rules on top of `models`.
//! - Repository traits separate business logic from data access.
//! - Every operation returns a [`errors::ServiceError`] from one shared taxonomy.
//! - Services are framework independent; the HTTP layer only maps inputs and errors.

pub mod errors;
pub mod domain;
pub mod rating;
pub mod access;
pub mod password;
pub mod token;
pub mod repository;
pub mod repo;
pub mod auth;
pub mod users;
pub mod orders;
pub mod catalog;
pub mod images;
#[cfg(test)]
pub mod test_support;
