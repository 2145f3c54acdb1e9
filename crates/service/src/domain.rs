//! Domain types shared by the services and repositories.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::rating;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Worker,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Worker => "worker",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "worker" => Ok(Role::Worker),
            "admin" => Ok(Role::Admin),
            other => Err(ServiceError::Validation(format!("invalid role: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Edges reachable through a status update. `pending -> accepted` is not
    /// one of them; that edge belongs to worker assignment.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Cancelled)
                | (Accepted, InProgress)
                | (Accepted, Completed)
                | (Accepted, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(OrderStatus::Pending),
            "accepted" => Ok(OrderStatus::Accepted),
            // the legacy API docs spelled it with a hyphen
            "in_progress" | "in-progress" => Ok(OrderStatus::InProgress),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ServiceError::Validation(format!("invalid status: {}", other))),
        }
    }
}

/// A registered account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub location: String,
    pub specialization: Option<String>,
    pub image: Option<String>,
    pub ratings: Vec<i16>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    pub fn average_rating(&self) -> f64 { rating::average(&self.ratings) }

    pub fn summary(&self) -> UserSummary {
        UserSummary { id: self.id, name: self.name.clone(), email: self.email.clone() }
    }
}

/// Public view of a user: the profile plus the computed average rating.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub average_rating: f64,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        let average_rating = user.average_rating();
        Self { user, average_rating }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Validated, normalized registration data handed to the repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub location: String,
    pub specialization: Option<String>,
}

/// Stored password hash for a user.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: Uuid,
    pub password_hash: String,
    pub password_algorithm: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub specialization: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceType {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTypeSummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceTypePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub worker_id: Option<Uuid>,
    pub service_type_id: Uuid,
    pub description: String,
    pub location: String,
    pub status: OrderStatus,
    pub scheduled_time: DateTime<Utc>,
    pub rating: Option<i16>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_assigned_to(&self, user_id: Uuid) -> bool { self.worker_id == Some(user_id) }
}

/// An order with its references resolved. A reference that no longer
/// resolves (deleted user or service type) is `None`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Option<UserSummary>,
    pub worker: Option<UserSummary>,
    pub service_type: Option<ServiceTypeSummary>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub service_type_id: Uuid,
    pub description: String,
    pub location: String,
    pub scheduled_time: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Which orders a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    /// Orders the customer created.
    Customer(Uuid),
    /// Orders assigned to the worker, plus every pending order.
    Worker(Uuid),
}

impl OrderScope {
    pub fn for_user(user: &User) -> Self {
        match user.role {
            Role::Admin => OrderScope::All,
            Role::Customer => OrderScope::Customer(user.id),
            Role::Worker => OrderScope::Worker(user.id),
        }
    }

    pub fn admits(&self, order: &Order) -> bool {
        match self {
            OrderScope::All => true,
            OrderScope::Customer(id) => order.customer_id == *id,
            OrderScope::Worker(id) => order.worker_id == Some(*id) || order.status == OrderStatus::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub scope: OrderScope,
    /// Case-insensitive substring of the location.
    pub location: Option<String>,
    /// Restrict to these service types (already resolved from a name filter).
    pub service_type_ids: Option<Vec<Uuid>>,
}
