use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Role, User};

/// Registration input as received from the client.
///
/// `role` stays a string so an unknown value is reported as a validation
/// error next to the other field errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    #[serde(default)]
    pub role: Option<String>,
    pub location: String,
    #[serde(default)]
    pub specialization: Option<String>,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// The part of a user echoed back with a fresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for SessionUser {
    fn from(u: &User) -> Self {
        Self { id: u.id, name: u.name.clone(), email: u.email.clone(), role: u.role }
    }
}

/// Register/login result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub message: String,
    pub token: String,
    pub user: SessionUser,
}
