pub mod auth;
pub mod orders;
pub mod service_types;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use self::auth::ServerState;
use crate::observability;
use crate::openapi::ApiDoc;

/// Headroom for multipart framing on top of the image size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> (axum::http::StatusCode, String) {
    observability::encode_metrics()
}

/// Build the full application router: API routes, uploaded images, docs and
/// the auth/metrics/cors/trace layers.
pub fn build_router(state: ServerState, cors: CorsLayer, upload_dir: &str) -> Router {
    let upload_limit = state.settings.max_upload_bytes + MULTIPART_OVERHEAD;

    let api = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        // auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // users
        .route("/users", get(users::list))
        .route(
            "/users/upload-image",
            post(users::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/users/:id", get(users::get).put(users::update).delete(users::delete))
        // service requests
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/:id", get(orders::get).delete(orders::delete))
        .route("/orders/:id/status", put(orders::update_status))
        .route("/orders/:id/assign", put(orders::assign))
        .route("/orders/:id/rate", put(orders::rate))
        // catalog
        .route("/service-types", get(service_types::list).post(service_types::create))
        .route(
            "/service-types/:id",
            get(service_types::get).put(service_types::update).delete(service_types::delete),
        );

    api.nest_service("/uploads", ServeDir::new(upload_dir))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(state.clone(), auth::authenticate))
        .with_state(state)
        .layer(middleware::from_fn(observability::track_requests))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request with method and path
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // status code and latency
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx and transport failures
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
