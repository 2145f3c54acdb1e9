//! Profile management for the user directory.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::access::{authorize, ensure_self_or_admin};
use crate::domain::{Role, User, UserFilter, UserPatch, UserProfile};
use crate::errors::ServiceError;
use crate::repository::UserRepository;

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

fn non_empty(field: &str, value: Option<String>) -> Result<Option<String>, ServiceError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Err(ServiceError::Validation(format!("{} cannot be empty", field))),
        other => Ok(other),
    }
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self { Self { users } }

    /// Admin-only directory listing.
    pub async fn list_users(&self, actor: &User, filter: UserFilter) -> Result<Vec<UserProfile>, ServiceError> {
        authorize(actor, &[Role::Admin])?;
        let filter = UserFilter { name: filter.name.filter(|n| !n.trim().is_empty()), ..filter };
        let users = self.users.list_users(&filter).await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    pub async fn get_user(&self, actor: &User, id: Uuid) -> Result<UserProfile, ServiceError> {
        let user = self.users.find_user(id).await?.ok_or_else(|| ServiceError::not_found("user"))?;
        ensure_self_or_admin(actor, id)?;
        Ok(user.into())
    }

    /// Self or admin. Only admins may toggle `is_active`; specialization
    /// only applies to workers.
    #[instrument(skip(self, actor, patch), fields(actor = %actor.id, user_id = %id))]
    pub async fn update_user(&self, actor: &User, id: Uuid, patch: UserPatch) -> Result<UserProfile, ServiceError> {
        let target = self.users.find_user(id).await?.ok_or_else(|| ServiceError::not_found("user"))?;
        ensure_self_or_admin(actor, id)?;
        if patch.is_active.is_some() && !actor.is_admin() {
            return Err(ServiceError::Forbidden("only admins can change account status".into()));
        }
        let name = non_empty("name", patch.name)?;
        if let Some(n) = &name {
            models::user::validate_name(n)?;
        }
        let specialization = non_empty("specialization", patch.specialization)?;
        if specialization.is_some() && target.role != Role::Worker {
            return Err(ServiceError::Validation("specialization only applies to workers".into()));
        }
        let patch = UserPatch {
            name,
            phone: non_empty("phone", patch.phone)?,
            location: non_empty("location", patch.location)?,
            specialization,
            is_active: patch.is_active,
        };
        let updated = self.users.update_user(id, patch).await?.ok_or_else(|| ServiceError::not_found("user"))?;
        info!("user_updated");
        Ok(updated.into())
    }

    /// Admin-only hard delete; orders that reference the user are left as they are.
    #[instrument(skip(self, actor), fields(actor = %actor.id, user_id = %id))]
    pub async fn delete_user(&self, actor: &User, id: Uuid) -> Result<(), ServiceError> {
        authorize(actor, &[Role::Admin])?;
        if !self.users.delete_user(id).await? {
            return Err(ServiceError::not_found("user"));
        }
        info!("user_deleted");
        Ok(())
    }

    /// Record an already stored image file on the caller's profile.
    pub async fn set_image(&self, actor: &User, filename: &str) -> Result<UserProfile, ServiceError> {
        let updated = self
            .users
            .set_image(actor.id, filename)
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))?;
        info!(user_id = %actor.id, filename, "user_image_updated");
        Ok(updated.into())
    }
}
