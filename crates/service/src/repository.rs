use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Credentials, NewOrder, NewUser, Order, OrderFilter, OrderStatus, ServiceType, ServiceTypePatch, User, UserFilter,
    UserPatch,
};
use crate::errors::ServiceError;

/// Persistence for users, their credentials and rating sequences.
///
/// Email lookups take an already normalized (trimmed, lower-cased) address.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates the user and its credentials together. Duplicate email is `Conflict`.
    async fn insert_user(&self, new: NewUser, password_hash: String, password_algorithm: &str) -> Result<User, ServiceError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, ServiceError>;
    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, ServiceError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError>;
    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, ServiceError>;
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, ServiceError>;
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, ServiceError>;
    async fn set_image(&self, id: Uuid, filename: &str) -> Result<Option<User>, ServiceError>;
    /// Removes the user with its credentials and ratings. Orders are untouched.
    async fn delete_user(&self, id: Uuid) -> Result<bool, ServiceError>;
}

#[async_trait]
pub trait ServiceTypeRepository: Send + Sync {
    /// Duplicate name is `Conflict`.
    async fn insert_service_type(&self, name: &str, description: &str) -> Result<ServiceType, ServiceError>;
    async fn find_service_type(&self, id: Uuid) -> Result<Option<ServiceType>, ServiceError>;
    async fn find_service_types(&self, ids: &[Uuid]) -> Result<Vec<ServiceType>, ServiceError>;
    async fn list_service_types(&self, include_inactive: bool) -> Result<Vec<ServiceType>, ServiceError>;
    /// Ids of every service type whose name contains `needle`, ignoring case.
    async fn service_type_ids_matching(&self, needle: &str) -> Result<Vec<Uuid>, ServiceError>;
    async fn update_service_type(&self, id: Uuid, patch: ServiceTypePatch) -> Result<Option<ServiceType>, ServiceError>;
    async fn delete_service_type(&self, id: Uuid) -> Result<bool, ServiceError>;
}

/// Order persistence. The conditional methods return `Ok(None)` when the row
/// exists but the precondition did not hold (or the row is absent); callers
/// tell the two apart with `find_order`.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert_order(&self, new: NewOrder) -> Result<Order, ServiceError>;
    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, ServiceError>;
    /// Newest first.
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, ServiceError>;
    /// `pending -> accepted` with the worker set, only while still pending.
    async fn assign_worker(&self, id: Uuid, worker_id: Uuid) -> Result<Option<Order>, ServiceError>;
    /// Writes `next` when the current status equals `expected` (any status for
    /// `None`) and, when `assigned_to` is set, the order is still assigned to
    /// that worker.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: Option<OrderStatus>,
        assigned_to: Option<Uuid>,
        next: OrderStatus,
    ) -> Result<Option<Order>, ServiceError>;
    /// Sets the order rating when it is completed and belongs to `customer_id`,
    /// and appends the value to the assigned worker's ratings in the same step.
    async fn rate(&self, id: Uuid, customer_id: Uuid, value: i16) -> Result<Option<Order>, ServiceError>;
    async fn delete_order(&self, id: Uuid) -> Result<bool, ServiceError>;
}

/// In-process store implementing every repository trait. Used by tests,
/// benches and the HTTP test harness.
pub mod memory {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct State {
        users: HashMap<Uuid, User>,
        creds: HashMap<Uuid, Credentials>,
        service_types: HashMap<Uuid, ServiceType>,
        orders: HashMap<Uuid, Order>,
    }

    /// One lock over all collections, so each call is atomic.
    #[derive(Default)]
    pub struct MemoryStore {
        state: Mutex<State>,
    }

    impl MemoryStore {
        pub fn new() -> Self { Self::default() }
    }

    fn contains_ci(haystack: &str, needle: &str) -> bool {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }

    #[async_trait]
    impl UserRepository for MemoryStore {
        async fn insert_user(&self, new: NewUser, password_hash: String, password_algorithm: &str) -> Result<User, ServiceError> {
            let mut st = self.state.lock().await;
            if st.users.values().any(|u| u.email == new.email) {
                return Err(ServiceError::Conflict("email already registered".into()));
            }
            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4(),
                name: new.name,
                email: new.email,
                phone: new.phone,
                role: new.role,
                location: new.location,
                specialization: new.specialization,
                image: None,
                ratings: Vec::new(),
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            st.creds.insert(
                user.id,
                Credentials { user_id: user.id, password_hash, password_algorithm: password_algorithm.to_string() },
            );
            st.users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn find_user(&self, id: Uuid) -> Result<Option<User>, ServiceError> {
            Ok(self.state.lock().await.users.get(&id).cloned())
        }

        async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, ServiceError> {
            let st = self.state.lock().await;
            Ok(ids.iter().filter_map(|id| st.users.get(id).cloned()).collect())
        }

        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
            let st = self.state.lock().await;
            Ok(st.users.values().find(|u| u.email == email).cloned())
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, ServiceError> {
            Ok(self.state.lock().await.creds.get(&user_id).cloned())
        }

        async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, ServiceError> {
            let st = self.state.lock().await;
            let mut out: Vec<User> = st
                .users
                .values()
                .filter(|u| filter.role.map_or(true, |r| u.role == r))
                .filter(|u| filter.name.as_deref().map_or(true, |n| contains_ci(&u.name, n)))
                .cloned()
                .collect();
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(out)
        }

        async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, ServiceError> {
            let mut st = self.state.lock().await;
            let Some(user) = st.users.get_mut(&id) else { return Ok(None) };
            if let Some(name) = patch.name { user.name = name; }
            if let Some(phone) = patch.phone { user.phone = phone; }
            if let Some(location) = patch.location { user.location = location; }
            if let Some(spec) = patch.specialization { user.specialization = Some(spec); }
            if let Some(active) = patch.is_active { user.is_active = active; }
            user.updated_at = Utc::now();
            Ok(Some(user.clone()))
        }

        async fn set_image(&self, id: Uuid, filename: &str) -> Result<Option<User>, ServiceError> {
            let mut st = self.state.lock().await;
            let Some(user) = st.users.get_mut(&id) else { return Ok(None) };
            user.image = Some(filename.to_string());
            user.updated_at = Utc::now();
            Ok(Some(user.clone()))
        }

        async fn delete_user(&self, id: Uuid) -> Result<bool, ServiceError> {
            let mut st = self.state.lock().await;
            st.creds.remove(&id);
            Ok(st.users.remove(&id).is_some())
        }
    }

    #[async_trait]
    impl ServiceTypeRepository for MemoryStore {
        async fn insert_service_type(&self, name: &str, description: &str) -> Result<ServiceType, ServiceError> {
            let mut st = self.state.lock().await;
            if st.service_types.values().any(|s| s.name == name) {
                return Err(ServiceError::Conflict("service type already exists".into()));
            }
            let now = Utc::now();
            let created = ServiceType {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: description.to_string(),
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            st.service_types.insert(created.id, created.clone());
            Ok(created)
        }

        async fn find_service_type(&self, id: Uuid) -> Result<Option<ServiceType>, ServiceError> {
            Ok(self.state.lock().await.service_types.get(&id).cloned())
        }

        async fn find_service_types(&self, ids: &[Uuid]) -> Result<Vec<ServiceType>, ServiceError> {
            let st = self.state.lock().await;
            Ok(ids.iter().filter_map(|id| st.service_types.get(id).cloned()).collect())
        }

        async fn list_service_types(&self, include_inactive: bool) -> Result<Vec<ServiceType>, ServiceError> {
            let st = self.state.lock().await;
            let mut out: Vec<ServiceType> =
                st.service_types.values().filter(|s| include_inactive || s.is_active).cloned().collect();
            out.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(out)
        }

        async fn service_type_ids_matching(&self, needle: &str) -> Result<Vec<Uuid>, ServiceError> {
            let st = self.state.lock().await;
            Ok(st.service_types.values().filter(|s| contains_ci(&s.name, needle)).map(|s| s.id).collect())
        }

        async fn update_service_type(&self, id: Uuid, patch: ServiceTypePatch) -> Result<Option<ServiceType>, ServiceError> {
            let mut st = self.state.lock().await;
            if let Some(name) = &patch.name {
                if st.service_types.values().any(|s| s.id != id && &s.name == name) {
                    return Err(ServiceError::Conflict("service type already exists".into()));
                }
            }
            let Some(current) = st.service_types.get_mut(&id) else { return Ok(None) };
            if let Some(name) = patch.name { current.name = name; }
            if let Some(description) = patch.description { current.description = description; }
            if let Some(active) = patch.is_active { current.is_active = active; }
            current.updated_at = Utc::now();
            Ok(Some(current.clone()))
        }

        async fn delete_service_type(&self, id: Uuid) -> Result<bool, ServiceError> {
            Ok(self.state.lock().await.service_types.remove(&id).is_some())
        }
    }

    #[async_trait]
    impl OrderRepository for MemoryStore {
        async fn insert_order(&self, new: NewOrder) -> Result<Order, ServiceError> {
            let now = Utc::now();
            let order = Order {
                id: Uuid::new_v4(),
                customer_id: new.customer_id,
                worker_id: None,
                service_type_id: new.service_type_id,
                description: new.description,
                location: new.location,
                status: OrderStatus::Pending,
                scheduled_time: new.scheduled_time,
                rating: None,
                notes: new.notes,
                created_at: now,
                updated_at: now,
            };
            self.state.lock().await.orders.insert(order.id, order.clone());
            Ok(order)
        }

        async fn find_order(&self, id: Uuid) -> Result<Option<Order>, ServiceError> {
            Ok(self.state.lock().await.orders.get(&id).cloned())
        }

        async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, ServiceError> {
            let st = self.state.lock().await;
            let mut out: Vec<Order> = st
                .orders
                .values()
                .filter(|o| filter.scope.admits(o))
                .filter(|o| filter.location.as_deref().map_or(true, |l| contains_ci(&o.location, l)))
                .filter(|o| filter.service_type_ids.as_ref().map_or(true, |ids| ids.contains(&o.service_type_id)))
                .cloned()
                .collect();
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(out)
        }

        async fn assign_worker(&self, id: Uuid, worker_id: Uuid) -> Result<Option<Order>, ServiceError> {
            let mut st = self.state.lock().await;
            match st.orders.get_mut(&id) {
                Some(order) if order.status == OrderStatus::Pending => {
                    order.worker_id = Some(worker_id);
                    order.status = OrderStatus::Accepted;
                    order.updated_at = Utc::now();
                    Ok(Some(order.clone()))
                }
                _ => Ok(None),
            }
        }

        async fn compare_and_set_status(
            &self,
            id: Uuid,
            expected: Option<OrderStatus>,
            assigned_to: Option<Uuid>,
            next: OrderStatus,
        ) -> Result<Option<Order>, ServiceError> {
            let mut st = self.state.lock().await;
            match st.orders.get_mut(&id) {
                Some(order)
                    if expected.map_or(true, |e| order.status == e)
                        && assigned_to.map_or(true, |w| order.worker_id == Some(w)) =>
                {
                    order.status = next;
                    order.updated_at = Utc::now();
                    Ok(Some(order.clone()))
                }
                _ => Ok(None),
            }
        }

        async fn rate(&self, id: Uuid, customer_id: Uuid, value: i16) -> Result<Option<Order>, ServiceError> {
            let mut st = self.state.lock().await;
            let Some(order) = st.orders.get_mut(&id) else { return Ok(None) };
            if order.status != OrderStatus::Completed || order.customer_id != customer_id {
                return Ok(None);
            }
            order.rating = Some(value);
            order.updated_at = Utc::now();
            let rated = order.clone();
            if let Some(worker) = rated.worker_id.and_then(|w| st.users.get_mut(&w)) {
                worker.ratings.push(value);
            }
            Ok(Some(rated))
        }

        async fn delete_order(&self, id: Uuid) -> Result<bool, ServiceError> {
            Ok(self.state.lock().await.orders.remove(&id).is_some())
        }
    }
}
