//! Service-type catalog. Mutations are admin-only; reads are public.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::access::authorize;
use crate::domain::{Role, ServiceType, ServiceTypePatch, User};
use crate::errors::ServiceError;
use crate::repository::ServiceTypeRepository;

pub struct CatalogService {
    service_types: Arc<dyn ServiceTypeRepository>,
}

impl CatalogService {
    pub fn new(service_types: Arc<dyn ServiceTypeRepository>) -> Self { Self { service_types } }

    #[instrument(skip(self, actor, description), fields(actor = %actor.id))]
    pub async fn create_service_type(&self, actor: &User, name: &str, description: &str) -> Result<ServiceType, ServiceError> {
        authorize(actor, &[Role::Admin])?;
        models::service_type::validate_name(name)?;
        models::service_type::validate_description(description)?;
        let created = self.service_types.insert_service_type(name.trim(), description.trim()).await?;
        info!(service_type_id = %created.id, "service_type_created");
        Ok(created)
    }

    /// Active entries only, unless an admin asks for everything.
    pub async fn list_service_types(&self, actor: Option<&User>, include_inactive: bool) -> Result<Vec<ServiceType>, ServiceError> {
        let include_inactive = include_inactive && actor.map_or(false, User::is_admin);
        self.service_types.list_service_types(include_inactive).await
    }

    pub async fn get_service_type(&self, id: Uuid) -> Result<ServiceType, ServiceError> {
        self.service_types
            .find_service_type(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("service type"))
    }

    #[instrument(skip(self, actor, patch), fields(actor = %actor.id, service_type_id = %id))]
    pub async fn update_service_type(&self, actor: &User, id: Uuid, patch: ServiceTypePatch) -> Result<ServiceType, ServiceError> {
        authorize(actor, &[Role::Admin])?;
        if let Some(name) = &patch.name {
            models::service_type::validate_name(name)?;
        }
        if let Some(description) = &patch.description {
            models::service_type::validate_description(description)?;
        }
        let patch = ServiceTypePatch {
            name: patch.name.map(|n| n.trim().to_string()),
            description: patch.description.map(|d| d.trim().to_string()),
            is_active: patch.is_active,
        };
        let updated = self
            .service_types
            .update_service_type(id, patch)
            .await?
            .ok_or_else(|| ServiceError::not_found("service type"))?;
        info!("service_type_updated");
        Ok(updated)
    }

    /// Hard delete. Orders that reference the entry keep a dangling id.
    #[instrument(skip(self, actor), fields(actor = %actor.id, service_type_id = %id))]
    pub async fn delete_service_type(&self, actor: &User, id: Uuid) -> Result<(), ServiceError> {
        authorize(actor, &[Role::Admin])?;
        if !self.service_types.delete_service_type(id).await? {
            return Err(ServiceError::not_found("service type"));
        }
        info!("service_type_deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    #[tokio::test]
    async fn create_is_admin_only_and_unique() {
        let h = Harness::new();
        let admin = h.user(Role::Admin, "admin@x.com").await;
        let worker = h.user(Role::Worker, "w@x.com").await;

        let err = h.catalog.create_service_type(&worker, "Plumbing", "Pipes").await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        h.catalog.create_service_type(&admin, " Plumbing ", "Pipes").await.unwrap();
        let dup = h.catalog.create_service_type(&admin, "Plumbing", "Again").await.unwrap_err();
        assert!(matches!(dup, ServiceError::Conflict(_)));
        let blank = h.catalog.create_service_type(&admin, "HVAC", " ").await.unwrap_err();
        assert!(matches!(blank, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn listing_hides_inactive_except_for_admins() {
        let h = Harness::new();
        let admin = h.user(Role::Admin, "admin@x.com").await;
        let cust = h.user(Role::Customer, "c@x.com").await;
        let hvac = h.catalog.create_service_type(&admin, "HVAC", "Air").await.unwrap();
        h.catalog.create_service_type(&admin, "Carpentry", "Wood").await.unwrap();
        h.catalog
            .update_service_type(&admin, hvac.id, ServiceTypePatch { is_active: Some(false), ..ServiceTypePatch::default() })
            .await
            .unwrap();

        assert_eq!(h.catalog.list_service_types(None, false).await.unwrap().len(), 1);
        assert_eq!(h.catalog.list_service_types(Some(&cust), true).await.unwrap().len(), 1);
        assert_eq!(h.catalog.list_service_types(Some(&admin), true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rename_onto_existing_name_conflicts() {
        let h = Harness::new();
        let admin = h.user(Role::Admin, "admin@x.com").await;
        h.catalog.create_service_type(&admin, "HVAC", "Air").await.unwrap();
        let wood = h.catalog.create_service_type(&admin, "Carpentry", "Wood").await.unwrap();
        let err = h
            .catalog
            .update_service_type(&admin, wood.id, ServiceTypePatch { name: Some("HVAC".into()), ..ServiceTypePatch::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let h = Harness::new();
        let admin = h.user(Role::Admin, "admin@x.com").await;
        let st = h.catalog.create_service_type(&admin, "HVAC", "Air").await.unwrap();
        h.catalog.delete_service_type(&admin, st.id).await.unwrap();
        assert!(matches!(h.catalog.get_service_type(st.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(h.catalog.delete_service_type(&admin, st.id).await, Err(ServiceError::NotFound(_))));
    }
}
