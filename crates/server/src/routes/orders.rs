use axum::{extract::State, http::StatusCode, Json};
use common::types::Message;
use serde::Deserialize;
use service::{
    domain::OrderDetails,
    orders::{CreateOrderInput, OrderQuery},
};
use uuid::Uuid;

use super::auth::ServerState;
use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::observability::{ORDERS_CREATED_TOTAL, ORDER_ASSIGNMENTS_TOTAL, RATINGS_TOTAL};

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: i16,
}

#[utoipa::path(post, path = "/orders", tag = "orders", security(("bearer_auth" = [])), request_body = crate::openapi::CreateOrderDoc,
    responses((status = 201, description = "Created", body = crate::openapi::OrderDoc), (status = 400, description = "Validation failed"), (status = 403, description = "Customers only")))]
pub async fn create(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(input): ApiJson<CreateOrderInput>,
) -> Result<(StatusCode, Json<OrderDetails>), JsonApiError> {
    let order = state.orders.create_order(&actor, input).await?;
    ORDERS_CREATED_TOTAL.inc();
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(get, path = "/orders", tag = "orders", security(("bearer_auth" = [])),
    params(("location" = Option<String>, Query, description = "Location substring"), ("service_type" = Option<String>, Query, description = "Service type name substring")),
    responses((status = 200, description = "Orders visible to the caller", body = [crate::openapi::OrderDoc])))]
pub async fn list(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    ApiQuery(q): ApiQuery<OrderQuery>,
) -> Result<Json<Vec<OrderDetails>>, JsonApiError> {
    Ok(Json(state.orders.list_orders(&actor, q).await?))
}

#[utoipa::path(get, path = "/orders/{id}", tag = "orders", security(("bearer_auth" = [])), params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, description = "Order", body = crate::openapi::OrderDoc), (status = 403, description = "Not a party to the order"), (status = 404, description = "Not found")))]
pub async fn get(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<OrderDetails>, JsonApiError> {
    Ok(Json(state.orders.get_order(&actor, id).await?))
}

#[utoipa::path(put, path = "/orders/{id}/status", tag = "orders", security(("bearer_auth" = [])), params(("id" = Uuid, Path, description = "Order id")),
    request_body = crate::openapi::StatusDoc,
    responses((status = 200, description = "Updated", body = crate::openapi::OrderDoc), (status = 403, description = "Not the assigned worker or an admin"), (status = 409, description = "Transition not allowed")))]
pub async fn update_status(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> Result<Json<OrderDetails>, JsonApiError> {
    Ok(Json(state.orders.update_status(&actor, id, &body.status).await?))
}

#[utoipa::path(put, path = "/orders/{id}/assign", tag = "orders", security(("bearer_auth" = [])), params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, description = "Assigned to the caller", body = crate::openapi::OrderDoc), (status = 409, description = "Not pending")))]
pub async fn assign(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<OrderDetails>, JsonApiError> {
    let order = state.orders.assign_worker(&actor, id).await?;
    ORDER_ASSIGNMENTS_TOTAL.inc();
    Ok(Json(order))
}

#[utoipa::path(put, path = "/orders/{id}/rate", tag = "orders", security(("bearer_auth" = [])), params(("id" = Uuid, Path, description = "Order id")),
    request_body = crate::openapi::RateDoc,
    responses((status = 200, description = "Rated", body = crate::openapi::OrderDoc), (status = 409, description = "Not completed")))]
pub async fn rate(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<RateRequest>,
) -> Result<Json<OrderDetails>, JsonApiError> {
    let order = state.orders.rate_worker(&actor, id, body.rating).await?;
    RATINGS_TOTAL.inc();
    Ok(Json(order))
}

#[utoipa::path(delete, path = "/orders/{id}", tag = "orders", security(("bearer_auth" = [])), params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, description = "Deleted"), (status = 403, description = "Not the owner or an admin"), (status = 404, description = "Not found")))]
pub async fn delete(
    State(state): State<ServerState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Message>, JsonApiError> {
    state.orders.delete_order(&actor, id).await?;
    Ok(Json(Message::new("Service request deleted")))
}
