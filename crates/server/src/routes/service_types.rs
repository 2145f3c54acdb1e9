use axum::{extract::State, http::StatusCode, Json};
use common::types::Message;
use serde::Deserialize;
use service::domain::{ServiceType, ServiceTypePatch};
use uuid::Uuid;

use super::auth::ServerState;
use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser, MaybeUser};

#[derive(Debug, Deserialize)]
pub struct CreateServiceTypeRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateServiceTypeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[utoipa::path(post, path = "/service-types", tag = "service-types", security(("bearer_auth" = [])), request_body = crate::openapi::CreateServiceTypeDoc,
    responses((status = 201, description = "Created", body = crate::openapi::ServiceTypeDoc), (status = 403, description = "Admins only"), (status = 409, description = "Name taken")))]
pub async fn create(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(body): ApiJson<CreateServiceTypeRequest>,
) -> Result<(StatusCode, Json<ServiceType>), JsonApiError> {
    let created = state.catalog.create_service_type(&actor, &body.name, &body.description).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/service-types", tag = "service-types",
    params(("include_inactive" = Option<bool>, Query, description = "Admins only")),
    responses((status = 200, description = "Service types", body = [crate::openapi::ServiceTypeDoc])))]
pub async fn list(
    State(state): State<ServerState>,
    MaybeUser(actor): MaybeUser,
    ApiQuery(q): ApiQuery<ListQuery>,
) -> Result<Json<Vec<ServiceType>>, JsonApiError> {
    Ok(Json(state.catalog.list_service_types(actor.as_ref(), q.include_inactive).await?))
}

#[utoipa::path(get, path = "/service-types/{id}", tag = "service-types", params(("id" = Uuid, Path, description = "Service type id")),
    responses((status = 200, description = "Service type", body = crate::openapi::ServiceTypeDoc), (status = 404, description = "Not found")))]
pub async fn get(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<ServiceType>, JsonApiError> {
    Ok(Json(state.catalog.get_service_type(id).await?))
}

#[utoipa::path(put, path = "/service-types/{id}", tag = "service-types", security(("bearer_auth" = [])), params(("id" = Uuid, Path, description = "Service type id")),
    request_body = crate::openapi::UpdateServiceTypeDoc,
    responses((status = 200, description = "Updated", body = crate::openapi::ServiceTypeDoc), (status = 404, description = "Not found"), (status = 409, description = "Name taken")))]
pub async fn update(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateServiceTypeRequest>,
) -> Result<Json<ServiceType>, JsonApiError> {
    let patch = ServiceTypePatch { name: body.name, description: body.description, is_active: body.is_active };
    Ok(Json(state.catalog.update_service_type(&actor, id, patch).await?))
}

#[utoipa::path(delete, path = "/service-types/{id}", tag = "service-types", security(("bearer_auth" = [])), params(("id" = Uuid, Path, description = "Service type id")),
    responses((status = 200, description = "Deleted"), (status = 403, description = "Admins only"), (status = 404, description = "Not found")))]
pub async fn delete(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Message>, JsonApiError> {
    state.catalog.delete_service_type(&actor, id).await?;
    Ok(Json(Message::new("Service type deleted")))
}
