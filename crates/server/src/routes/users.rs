use axum::{
    extract::{Multipart, State},
    Json,
};
use common::types::Message;
use serde::Deserialize;
use service::{
    domain::{Role, UserFilter, UserPatch, UserProfile},
    errors::ServiceError,
    images::validate_image,
};
use uuid::Uuid;

use super::auth::ServerState;
use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub specialization: Option<String>,
    pub is_active: Option<bool>,
}

#[utoipa::path(get, path = "/users", tag = "users", security(("bearer_auth" = [])),
    params(("role" = Option<String>, Query, description = "customer | worker | admin"), ("name" = Option<String>, Query, description = "Name substring")),
    responses((status = 200, description = "Users", body = [crate::openapi::UserDoc]), (status = 403, description = "Admins only")))]
pub async fn list(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    ApiQuery(q): ApiQuery<UserListQuery>,
) -> Result<Json<Vec<UserProfile>>, JsonApiError> {
    let role = match q.role.as_deref().filter(|r| !r.trim().is_empty()) {
        Some(r) => Some(r.parse::<Role>()?),
        None => None,
    };
    let users = state.users.list_users(&actor, UserFilter { role, name: q.name }).await?;
    Ok(Json(users))
}

#[utoipa::path(get, path = "/users/{id}", tag = "users", security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "User", body = crate::openapi::UserDoc), (status = 403, description = "Not self or admin"), (status = 404, description = "Not found")))]
pub async fn get(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<UserProfile>, JsonApiError> {
    Ok(Json(state.users.get_user(&actor, id).await?))
}

#[utoipa::path(put, path = "/users/{id}", tag = "users", security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")), request_body = crate::openapi::UpdateUserDoc,
    responses((status = 200, description = "Updated", body = crate::openapi::UserDoc), (status = 400, description = "Validation failed"), (status = 403, description = "Not self or admin")))]
pub async fn update(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserProfile>, JsonApiError> {
    let patch = UserPatch {
        name: body.name,
        phone: body.phone,
        location: body.location,
        specialization: body.specialization,
        is_active: body.is_active,
    };
    Ok(Json(state.users.update_user(&actor, id, patch).await?))
}

#[utoipa::path(delete, path = "/users/{id}", tag = "users", security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "Deleted"), (status = 403, description = "Admins only"), (status = 404, description = "Not found")))]
pub async fn delete(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Message>, JsonApiError> {
    state.users.delete_user(&actor, id).await?;
    Ok(Json(Message::new("User deleted")))
}

/// Multipart upload of one `image` field; the stored name goes on the caller's profile.
#[utoipa::path(post, path = "/users/upload-image", tag = "users", security(("bearer_auth" = [])),
    request_body(content = crate::openapi::ImageUploadDoc, content_type = "multipart/form-data"),
    responses((status = 200, description = "Image stored", body = crate::openapi::UserDoc), (status = 400, description = "Missing or invalid image")))]
pub async fn upload_image(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<UserProfile>, JsonApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await?;
        let ext = validate_image(content_type.as_deref(), file_name.as_deref(), bytes.len(), state.settings.max_upload_bytes)?;
        let filename = state.images.store_image(&bytes, &ext).await?;
        return Ok(Json(state.users.set_image(&actor, &filename).await?));
    }
    Err(ServiceError::Validation("no image uploaded".into()).into())
}
