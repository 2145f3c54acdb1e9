#![cfg(test)]
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::{domain::RegisterInput, AuthService};
use crate::catalog::CatalogService;
use crate::domain::{Order, OrderStatus, Role, User};
use crate::orders::OrderService;
use crate::repository::memory::MemoryStore;
use crate::token::TokenConfig;
use crate::users::UserService;

/// Every service wired to one in-memory store.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub auth: AuthService,
    pub users: UserService,
    pub orders: OrderService,
    pub catalog: CatalogService,
}

impl Harness {
    pub fn new() -> Self { Self::with_strict_transitions(true) }

    pub fn with_strict_transitions(strict: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            auth: AuthService::new(store.clone(), &TokenConfig::new("test-secret", 1), 6),
            users: UserService::new(store.clone()),
            orders: OrderService::new(store.clone(), store.clone(), store.clone(), strict),
            catalog: CatalogService::new(store.clone()),
            store,
        }
    }

    /// Provision a user with password `secret1`, admins included.
    pub async fn user(&self, role: Role, email: &str) -> User {
        self.auth.provision(register_input(email, role)).await.expect("provision user")
    }
}

pub fn register_input(email: &str, role: Role) -> RegisterInput {
    RegisterInput {
        name: email.split('@').next().unwrap_or("user").to_string(),
        email: email.into(),
        password: "secret1".into(),
        phone: "1234567890".into(),
        role: Some(role.as_str().into()),
        location: "New York".into(),
        specialization: (role == Role::Worker).then(|| "Plumbing".to_string()),
    }
}

pub fn sample_user(role: Role) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        name: "Sample".into(),
        email: format!("{}@example.com", Uuid::new_v4()),
        phone: "1234567890".into(),
        role,
        location: "New York".into(),
        specialization: None,
        image: None,
        ratings: Vec::new(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_order(customer_id: Uuid) -> Order {
    let now = Utc::now();
    Order {
        id: Uuid::new_v4(),
        customer_id,
        worker_id: None,
        service_type_id: Uuid::new_v4(),
        description: "Fix the sink".into(),
        location: "New York".into(),
        status: OrderStatus::Pending,
        scheduled_time: now,
        rating: None,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}
