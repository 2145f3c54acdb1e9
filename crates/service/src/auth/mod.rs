//! Credential store and session issuance: registration, login and bearer
//! token resolution.

pub mod domain;
pub mod service;

pub use service::AuthService;
