//! Order lifecycle: creation, role-scoped reads, worker assignment, status
//! transitions, rating and deletion.
//!
//! Every state-dependent write is a conditional update in the repository, so
//! two racing requests cannot both pass the same precondition.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::access::{authorize, ensure_order_owner_or_admin, ensure_order_party};
use crate::domain::{
    NewOrder, Order, OrderDetails, OrderFilter, OrderScope, OrderStatus, Role, ServiceTypeSummary, User,
};
use crate::errors::ServiceError;
use crate::rating;
use crate::repository::{OrderRepository, ServiceTypeRepository, UserRepository};

pub const MAX_NOTE_WORDS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderInput {
    pub service_type: Uuid,
    pub description: String,
    pub location: String,
    pub scheduled_time: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Optional list filters, combined with the caller's scope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
    pub location: Option<String>,
    /// Substring of the service-type name.
    pub service_type: Option<String>,
}

pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    users: Arc<dyn UserRepository>,
    service_types: Arc<dyn ServiceTypeRepository>,
    strict_transitions: bool,
}

fn not_found() -> ServiceError { ServiceError::not_found("service request") }

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        users: Arc<dyn UserRepository>,
        service_types: Arc<dyn ServiceTypeRepository>,
        strict_transitions: bool,
    ) -> Self {
        Self { orders, users, service_types, strict_transitions }
    }

    #[instrument(skip(self, actor, input), fields(customer_id = %actor.id, service_type_id = %input.service_type))]
    pub async fn create_order(&self, actor: &User, input: CreateOrderInput) -> Result<OrderDetails, ServiceError> {
        authorize(actor, &[Role::Customer])?;
        let mut errors = Vec::new();
        let description = input.description.trim().to_string();
        if description.is_empty() {
            errors.push("description is required".to_string());
        }
        let location = input.location.trim().to_string();
        if location.is_empty() {
            errors.push("location is required".to_string());
        }
        let notes = non_blank(input.notes);
        if notes.as_deref().map_or(false, |n| n.split_whitespace().count() > MAX_NOTE_WORDS) {
            errors.push(format!("notes cannot exceed {} words", MAX_NOTE_WORDS));
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors.join("; ")));
        }
        if self.service_types.find_service_type(input.service_type).await?.is_none() {
            return Err(ServiceError::Validation("service type does not exist".into()));
        }

        let order = self
            .orders
            .insert_order(NewOrder {
                customer_id: actor.id,
                service_type_id: input.service_type,
                description,
                location,
                scheduled_time: input.scheduled_time,
                notes,
            })
            .await?;
        info!(order_id = %order.id, "order_created");
        self.details_one(order).await
    }

    /// Customers see their own orders, workers their assigned orders plus
    /// every pending one, admins everything.
    pub async fn list_orders(&self, actor: &User, query: OrderQuery) -> Result<Vec<OrderDetails>, ServiceError> {
        let service_type_ids = match non_blank(query.service_type) {
            Some(needle) => Some(self.service_types.service_type_ids_matching(&needle).await?),
            None => None,
        };
        let filter = OrderFilter { scope: OrderScope::for_user(actor), location: non_blank(query.location), service_type_ids };
        let orders = self.orders.list_orders(&filter).await?;
        self.details(orders).await
    }

    pub async fn get_order(&self, actor: &User, id: Uuid) -> Result<OrderDetails, ServiceError> {
        let order = self.orders.find_order(id).await?.ok_or_else(not_found)?;
        ensure_order_party(actor, &order)?;
        self.details_one(order).await
    }

    /// Assigned worker or admin. In strict mode only the edges allowed by
    /// [`OrderStatus::can_transition_to`] are accepted.
    #[instrument(skip(self, actor), fields(actor = %actor.id, order_id = %id))]
    pub async fn update_status(&self, actor: &User, id: Uuid, status: &str) -> Result<OrderDetails, ServiceError> {
        authorize(actor, &[Role::Worker, Role::Admin])?;
        let next: OrderStatus = status.parse()?;
        let current = self.orders.find_order(id).await?.ok_or_else(not_found)?;
        if actor.role == Role::Worker && !current.is_assigned_to(actor.id) {
            return Err(ServiceError::access_denied());
        }

        let expected = if self.strict_transitions {
            if !current.status.can_transition_to(next) {
                return Err(ServiceError::Conflict(format!("cannot change status from {} to {}", current.status, next)));
            }
            Some(current.status)
        } else {
            None
        };
        // a worker's write only lands while the order is still theirs
        let assigned_to = (actor.role == Role::Worker).then_some(actor.id);
        let updated = match self.orders.compare_and_set_status(id, expected, assigned_to, next).await? {
            Some(o) => o,
            None => return Err(self.lost_race(id, "order status changed concurrently").await),
        };
        info!(from = %current.status, to = %next, "order_status_updated");
        self.details_one(updated).await
    }

    /// A worker claims a pending order. Succeeds at most once per order.
    #[instrument(skip(self, actor), fields(worker_id = %actor.id, order_id = %id))]
    pub async fn assign_worker(&self, actor: &User, id: Uuid) -> Result<OrderDetails, ServiceError> {
        authorize(actor, &[Role::Worker])?;
        match self.orders.assign_worker(id, actor.id).await? {
            Some(order) => {
                info!("order_assigned");
                self.details_one(order).await
            }
            None => Err(self.lost_race(id, "job is not available for assignment").await),
        }
    }

    /// The order's customer rates a completed order. The order keeps the
    /// latest value; the worker's sequence gains one entry per call.
    #[instrument(skip(self, actor), fields(customer_id = %actor.id, order_id = %id))]
    pub async fn rate_worker(&self, actor: &User, id: Uuid, value: i16) -> Result<OrderDetails, ServiceError> {
        authorize(actor, &[Role::Customer])?;
        rating::validate(value)?;
        let order = self.orders.find_order(id).await?.ok_or_else(not_found)?;
        if order.customer_id != actor.id {
            return Err(ServiceError::access_denied());
        }
        if order.status != OrderStatus::Completed {
            return Err(ServiceError::Conflict("service not completed yet".into()));
        }
        let rated = match self.orders.rate(id, actor.id, value).await? {
            Some(o) => o,
            None => return Err(self.lost_race(id, "service not completed yet").await),
        };
        if rated.worker_id.is_none() {
            warn!("rated order has no worker; rating not recorded on any profile");
        }
        info!(worker_id = ?rated.worker_id, rating = value, "worker_rated");
        self.details_one(rated).await
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id, order_id = %id))]
    pub async fn delete_order(&self, actor: &User, id: Uuid) -> Result<(), ServiceError> {
        let order = self.orders.find_order(id).await?.ok_or_else(not_found)?;
        ensure_order_owner_or_admin(actor, &order)?;
        if !self.orders.delete_order(id).await? {
            return Err(not_found());
        }
        info!("order_deleted");
        Ok(())
    }

    /// A conditional write matched nothing: the order is gone or its state moved.
    async fn lost_race(&self, id: Uuid, conflict: &str) -> ServiceError {
        match self.orders.find_order(id).await {
            Ok(Some(_)) => ServiceError::Conflict(conflict.to_string()),
            Ok(None) => not_found(),
            Err(e) => e,
        }
    }

    async fn details_one(&self, order: Order) -> Result<OrderDetails, ServiceError> {
        self.details(vec![order]).await?.pop().ok_or_else(not_found)
    }

    /// Resolve customer, worker and service type for each order in two batched lookups.
    async fn details(&self, orders: Vec<Order>) -> Result<Vec<OrderDetails>, ServiceError> {
        let mut user_ids: Vec<Uuid> = orders.iter().flat_map(|o| std::iter::once(o.customer_id).chain(o.worker_id)).collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let mut st_ids: Vec<Uuid> = orders.iter().map(|o| o.service_type_id).collect();
        st_ids.sort_unstable();
        st_ids.dedup();

        let users: HashMap<Uuid, User> = self.users.find_users(&user_ids).await?.into_iter().map(|u| (u.id, u)).collect();
        let service_types: HashMap<Uuid, ServiceTypeSummary> = self
            .service_types
            .find_service_types(&st_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, ServiceTypeSummary { id: s.id, name: s.name }))
            .collect();

        Ok(orders
            .into_iter()
            .map(|order| OrderDetails {
                customer: users.get(&order.customer_id).map(User::summary),
                worker: order.worker_id.and_then(|w| users.get(&w)).map(User::summary),
                service_type: service_types.get(&order.service_type_id).cloned(),
                order,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    async fn setup(h: &Harness) -> (User, User, User, Uuid) {
        let admin = h.user(Role::Admin, "admin@x.com").await;
        let customer = h.user(Role::Customer, "a@x.com").await;
        let worker = h.user(Role::Worker, "b@x.com").await;
        let st = h.catalog.create_service_type(&admin, "Plumbing", "Pipes and drains").await.unwrap();
        (admin, customer, worker, st.id)
    }

    fn input(service_type: Uuid) -> CreateOrderInput {
        CreateOrderInput {
            service_type,
            description: "Leaking faucet in kitchen".into(),
            location: "123 Main St, New York".into(),
            scheduled_time: Utc::now(),
            notes: Some("Please bring tools".into()),
        }
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let h = Harness::new();
        let (admin, customer, worker, st) = setup(&h).await;

        let created = h.orders.create_order(&customer, input(st)).await.unwrap();
        assert_eq!(created.order.status, OrderStatus::Pending);
        assert!(created.order.worker_id.is_none());
        assert_eq!(created.service_type.as_ref().map(|s| s.name.as_str()), Some("Plumbing"));
        assert_eq!(created.customer.as_ref().map(|c| c.id), Some(customer.id));

        let assigned = h.orders.assign_worker(&worker, created.order.id).await.unwrap();
        assert_eq!(assigned.order.status, OrderStatus::Accepted);
        assert_eq!(assigned.order.worker_id, Some(worker.id));
        assert_eq!(assigned.worker.map(|w| w.id), Some(worker.id));

        let done = h.orders.update_status(&admin, created.order.id, "completed").await.unwrap();
        assert_eq!(done.order.status, OrderStatus::Completed);

        let rated = h.orders.rate_worker(&customer, created.order.id, 5).await.unwrap();
        assert_eq!(rated.order.rating, Some(5));
        let w = h.store.find_user(worker.id).await.unwrap().unwrap();
        assert_eq!(w.ratings, vec![5]);
        assert_eq!(w.average_rating(), 5.0);
    }

    #[tokio::test]
    async fn only_customers_create_and_service_type_must_exist() {
        let h = Harness::new();
        let (admin, customer, worker, st) = setup(&h).await;
        assert!(matches!(h.orders.create_order(&worker, input(st)).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(h.orders.create_order(&admin, input(st)).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(h.orders.create_order(&customer, input(Uuid::new_v4())).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn notes_are_capped_at_fifty_words() {
        let h = Harness::new();
        let (_, customer, _, st) = setup(&h).await;
        let mut long = input(st);
        long.notes = Some(vec!["word"; 51].join(" "));
        assert!(matches!(h.orders.create_order(&customer, long).await, Err(ServiceError::Validation(_))));
        let mut exact = input(st);
        exact.notes = Some(vec!["word"; 50].join(" "));
        assert!(h.orders.create_order(&customer, exact).await.is_ok());
    }

    #[tokio::test]
    async fn second_assignment_conflicts() {
        let h = Harness::new();
        let (_, customer, worker, st) = setup(&h).await;
        let other = h.user(Role::Worker, "c@x.com").await;
        let o = h.orders.create_order(&customer, input(st)).await.unwrap();
        h.orders.assign_worker(&worker, o.order.id).await.unwrap();
        assert!(matches!(h.orders.assign_worker(&other, o.order.id).await, Err(ServiceError::Conflict(_))));
        assert!(matches!(h.orders.assign_worker(&worker, o.order.id).await, Err(ServiceError::Conflict(_))));
        assert!(matches!(h.orders.assign_worker(&worker, Uuid::new_v4()).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn concurrent_assignment_has_one_winner() {
        let h = Harness::new();
        let (_, customer, worker, st) = setup(&h).await;
        let other = h.user(Role::Worker, "c@x.com").await;
        let o = h.orders.create_order(&customer, input(st)).await.unwrap();
        let (a, b) = tokio::join!(h.orders.assign_worker(&worker, o.order.id), h.orders.assign_worker(&other, o.order.id));
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|x| **x).count(), 1);
    }

    #[tokio::test]
    async fn status_updates_need_the_assigned_worker() {
        let h = Harness::new();
        let (_, customer, worker, st) = setup(&h).await;
        let other = h.user(Role::Worker, "c@x.com").await;
        let o = h.orders.create_order(&customer, input(st)).await.unwrap();
        h.orders.assign_worker(&worker, o.order.id).await.unwrap();

        assert!(matches!(h.orders.update_status(&other, o.order.id, "completed").await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(h.orders.update_status(&customer, o.order.id, "completed").await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(h.orders.update_status(&worker, o.order.id, "finished").await, Err(ServiceError::Validation(_))));
        let started = h.orders.update_status(&worker, o.order.id, "in_progress").await.unwrap();
        assert_eq!(started.order.status, OrderStatus::InProgress);
    }

    #[tokio::test]
    async fn strict_mode_rejects_illegal_edges() {
        let h = Harness::new();
        let (admin, customer, worker, st) = setup(&h).await;
        let o = h.orders.create_order(&customer, input(st)).await.unwrap();
        // pending -> accepted only via assignment
        assert!(matches!(h.orders.update_status(&admin, o.order.id, "accepted").await, Err(ServiceError::Conflict(_))));
        h.orders.assign_worker(&worker, o.order.id).await.unwrap();
        h.orders.update_status(&worker, o.order.id, "completed").await.unwrap();
        assert!(matches!(h.orders.update_status(&admin, o.order.id, "pending").await, Err(ServiceError::Conflict(_))));
        assert!(matches!(h.orders.update_status(&admin, o.order.id, "cancelled").await, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn permissive_mode_writes_any_status() {
        let h = Harness::with_strict_transitions(false);
        let (admin, customer, _, st) = setup(&h).await;
        let o = h.orders.create_order(&customer, input(st)).await.unwrap();
        let done = h.orders.update_status(&admin, o.order.id, "completed").await.unwrap();
        assert_eq!(done.order.status, OrderStatus::Completed);
        let back = h.orders.update_status(&admin, o.order.id, "pending").await.unwrap();
        assert_eq!(back.order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn status_write_requires_assignment_to_still_hold() {
        let h = Harness::with_strict_transitions(false);
        let (_, customer, worker, st) = setup(&h).await;
        let other = h.user(Role::Worker, "c@x.com").await;
        let o = h.orders.create_order(&customer, input(st)).await.unwrap();
        h.orders.assign_worker(&worker, o.order.id).await.unwrap();

        // the order moved to `worker` after `other` read it
        let stale = h.store.compare_and_set_status(o.order.id, None, Some(other.id), OrderStatus::Completed).await.unwrap();
        assert!(stale.is_none());
        let current = h.store.find_order(o.order.id).await.unwrap().unwrap();
        assert_eq!(current.status, OrderStatus::Accepted);

        let done = h.store.compare_and_set_status(o.order.id, None, Some(worker.id), OrderStatus::Completed).await.unwrap();
        assert_eq!(done.map(|d| d.status), Some(OrderStatus::Completed));
        // admins write without an assignment condition
        let reset = h.store.compare_and_set_status(o.order.id, None, None, OrderStatus::Pending).await.unwrap();
        assert_eq!(reset.map(|d| d.status), Some(OrderStatus::Pending));
    }

    #[tokio::test]
    async fn rating_preconditions() {
        let h = Harness::new();
        let (admin, customer, worker, st) = setup(&h).await;
        let stranger = h.user(Role::Customer, "s@x.com").await;
        let o = h.orders.create_order(&customer, input(st)).await.unwrap();
        let id = o.order.id;

        assert!(matches!(h.orders.rate_worker(&customer, id, 5).await, Err(ServiceError::Conflict(_))));
        h.orders.assign_worker(&worker, id).await.unwrap();
        h.orders.update_status(&admin, id, "completed").await.unwrap();

        assert!(matches!(h.orders.rate_worker(&stranger, id, 5).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(h.orders.rate_worker(&worker, id, 5).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(h.orders.rate_worker(&customer, id, 6).await, Err(ServiceError::Validation(_))));

        h.orders.rate_worker(&customer, id, 3).await.unwrap();
        let again = h.orders.rate_worker(&customer, id, 5).await.unwrap();
        assert_eq!(again.order.rating, Some(5));
        let w = h.store.find_user(worker.id).await.unwrap().unwrap();
        assert_eq!(w.ratings, vec![3, 5]);
        assert_eq!(w.average_rating(), 4.0);
    }

    #[tokio::test]
    async fn rating_unassigned_completed_order_touches_no_profile() {
        let h = Harness::with_strict_transitions(false);
        let (admin, customer, worker, st) = setup(&h).await;
        let o = h.orders.create_order(&customer, input(st)).await.unwrap();
        h.orders.update_status(&admin, o.order.id, "completed").await.unwrap();
        let rated = h.orders.rate_worker(&customer, o.order.id, 4).await.unwrap();
        assert_eq!(rated.order.rating, Some(4));
        assert!(h.store.find_user(worker.id).await.unwrap().unwrap().ratings.is_empty());
    }

    #[tokio::test]
    async fn listing_is_scoped_by_role() {
        let h = Harness::new();
        let (admin, a, worker, st) = setup(&h).await;
        let b = h.user(Role::Customer, "other@x.com").await;
        let other_worker = h.user(Role::Worker, "w2@x.com").await;

        let a1 = h.orders.create_order(&a, input(st)).await.unwrap();
        let a2 = h.orders.create_order(&a, input(st)).await.unwrap();
        let b1 = h.orders.create_order(&b, input(st)).await.unwrap();
        h.orders.assign_worker(&worker, a1.order.id).await.unwrap();
        h.orders.assign_worker(&other_worker, b1.order.id).await.unwrap();

        let for_a = h.orders.list_orders(&a, OrderQuery::default()).await.unwrap();
        assert_eq!(for_a.len(), 2);
        assert!(for_a.iter().all(|o| o.order.customer_id == a.id));

        let ids: Vec<Uuid> = h.orders.list_orders(&worker, OrderQuery::default()).await.unwrap().iter().map(|o| o.order.id).collect();
        assert!(ids.contains(&a1.order.id));
        assert!(ids.contains(&a2.order.id));
        assert!(!ids.contains(&b1.order.id));

        assert_eq!(h.orders.list_orders(&admin, OrderQuery::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn listing_filters_combine() {
        let h = Harness::new();
        let (admin, a, _, plumbing) = setup(&h).await;
        let hvac = h.catalog.create_service_type(&admin, "HVAC", "Air").await.unwrap();
        h.orders.create_order(&a, input(plumbing)).await.unwrap();
        let mut boston = input(hvac.id);
        boston.location = "Boston".into();
        h.orders.create_order(&a, boston).await.unwrap();

        let q = |location: Option<&str>, service_type: Option<&str>| OrderQuery {
            location: location.map(str::to_string),
            service_type: service_type.map(str::to_string),
        };
        assert_eq!(h.orders.list_orders(&a, q(Some("new york"), None)).await.unwrap().len(), 1);
        assert_eq!(h.orders.list_orders(&a, q(None, Some("plumb"))).await.unwrap().len(), 1);
        assert_eq!(h.orders.list_orders(&a, q(Some("boston"), Some("plumb"))).await.unwrap().len(), 0);
        assert_eq!(h.orders.list_orders(&a, q(None, Some("nothing"))).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn get_and_delete_ownership() {
        let h = Harness::new();
        let (admin, a, worker, st) = setup(&h).await;
        let stranger = h.user(Role::Customer, "s@x.com").await;
        let o = h.orders.create_order(&a, input(st)).await.unwrap();
        let id = o.order.id;

        assert!(matches!(h.orders.get_order(&stranger, id).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(h.orders.get_order(&worker, id).await, Err(ServiceError::Forbidden(_))));
        h.orders.assign_worker(&worker, id).await.unwrap();
        assert!(h.orders.get_order(&worker, id).await.is_ok());

        assert!(matches!(h.orders.delete_order(&worker, id).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(h.orders.delete_order(&stranger, id).await, Err(ServiceError::Forbidden(_))));
        h.orders.delete_order(&a, id).await.unwrap();
        assert!(matches!(h.orders.get_order(&admin, id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn dangling_references_render_as_none() {
        let h = Harness::new();
        let (admin, a, _, st) = setup(&h).await;
        let o = h.orders.create_order(&a, input(st)).await.unwrap();
        h.catalog.delete_service_type(&admin, st).await.unwrap();
        let view = h.orders.get_order(&admin, o.order.id).await.unwrap();
        assert!(view.service_type.is_none());
        assert_eq!(view.order.service_type_id, st);
    }
}
