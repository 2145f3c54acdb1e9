//! Role gate plus the per-resource ownership rules layered on top of it.
//!
//! Ownership failures are `Forbidden`, never `NotFound`: callers only reach
//! these checks after the resource was loaded.

use crate::domain::{Order, Role, User};
use crate::errors::ServiceError;

/// Passes when `required` is empty or contains the user's role.
pub fn authorize(user: &User, required: &[Role]) -> Result<(), ServiceError> {
    if required.is_empty() || required.contains(&user.role) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!("role {} is not allowed here", user.role)))
    }
}

pub fn ensure_self_or_admin(user: &User, subject_id: uuid::Uuid) -> Result<(), ServiceError> {
    if user.is_admin() || user.id == subject_id {
        Ok(())
    } else {
        Err(ServiceError::access_denied())
    }
}

/// Admin, the order's customer, or its assigned worker.
pub fn ensure_order_party(user: &User, order: &Order) -> Result<(), ServiceError> {
    if user.is_admin() || order.customer_id == user.id || order.is_assigned_to(user.id) {
        Ok(())
    } else {
        Err(ServiceError::access_denied())
    }
}

/// Admin or the customer who created the order.
pub fn ensure_order_owner_or_admin(user: &User, order: &Order) -> Result<(), ServiceError> {
    if user.is_admin() || order.customer_id == user.id {
        Ok(())
    } else {
        Err(ServiceError::access_denied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_order, sample_user};

    #[test]
    fn empty_requirement_admits_everyone() {
        let u = sample_user(Role::Customer);
        assert!(authorize(&u, &[]).is_ok());
    }

    #[test]
    fn role_outside_requirement_is_forbidden() {
        let u = sample_user(Role::Worker);
        assert!(authorize(&u, &[Role::Worker, Role::Admin]).is_ok());
        assert!(matches!(authorize(&u, &[Role::Customer]), Err(ServiceError::Forbidden(_))));
    }

    #[test]
    fn order_party_rules() {
        let customer = sample_user(Role::Customer);
        let worker = sample_user(Role::Worker);
        let stranger = sample_user(Role::Worker);
        let admin = sample_user(Role::Admin);
        let mut order = sample_order(customer.id);
        order.worker_id = Some(worker.id);

        assert!(ensure_order_party(&customer, &order).is_ok());
        assert!(ensure_order_party(&worker, &order).is_ok());
        assert!(ensure_order_party(&admin, &order).is_ok());
        assert!(matches!(ensure_order_party(&stranger, &order), Err(ServiceError::Forbidden(_))));

        assert!(ensure_order_owner_or_admin(&customer, &order).is_ok());
        assert!(ensure_order_owner_or_admin(&admin, &order).is_ok());
        assert!(ensure_order_owner_or_admin(&worker, &order).is_err());
    }

    #[test]
    fn self_or_admin() {
        let a = sample_user(Role::Customer);
        let b = sample_user(Role::Customer);
        let admin = sample_user(Role::Admin);
        assert!(ensure_self_or_admin(&a, a.id).is_ok());
        assert!(ensure_self_or_admin(&admin, a.id).is_ok());
        assert!(ensure_self_or_admin(&b, a.id).is_err());
    }
}
