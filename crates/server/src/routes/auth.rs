use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use configs::AppConfig;
use service::{
    auth::{
        domain::{AuthSession, LoginInput, RegisterInput},
        AuthService,
    },
    catalog::CatalogService,
    domain::UserProfile,
    errors::ServiceError,
    images::ImageStore,
    orders::OrderService,
    repository::{OrderRepository, ServiceTypeRepository, UserRepository},
    token::TokenConfig,
    users::UserService,
};

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, CurrentUser};
use crate::observability::{LOGINS_TOTAL, REGISTRATIONS_TOTAL};

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone, Debug)]
pub struct ServerSettings {
    pub max_upload_bytes: usize,
}

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub orders: Arc<OrderService>,
    pub catalog: Arc<CatalogService>,
    pub images: Arc<dyn ImageStore>,
    pub settings: ServerSettings,
}

impl ServerState {
    /// Wire every service to one store implementing all repositories.
    pub fn new<R>(repo: Arc<R>, images: Arc<dyn ImageStore>, cfg: &AppConfig) -> Self
    where
        R: UserRepository + ServiceTypeRepository + OrderRepository + 'static,
    {
        let tokens = TokenConfig::new(cfg.auth.jwt_secret.clone(), cfg.auth.token_ttl_hours);
        Self {
            auth: Arc::new(AuthService::new(repo.clone(), &tokens, cfg.auth.min_password_len)),
            users: Arc::new(UserService::new(repo.clone())),
            orders: Arc::new(OrderService::new(repo.clone(), repo.clone(), repo.clone(), cfg.orders.strict_transitions)),
            catalog: Arc::new(CatalogService::new(repo)),
            images,
            settings: ServerSettings { max_upload_bytes: cfg.server.max_upload_bytes },
        }
    }
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest,
    responses((status = 201, description = "Registered", body = crate::openapi::SessionDoc), (status = 400, description = "Validation failed"), (status = 409, description = "Email already registered")))]
pub async fn register(
    State(state): State<ServerState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<AuthSession>), JsonApiError> {
    let session = state.auth.register(input).await?;
    REGISTRATIONS_TOTAL.inc();
    Ok((StatusCode::CREATED, Json(session)))
}

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest,
    responses((status = 200, description = "Logged in", body = crate::openapi::SessionDoc), (status = 401, description = "Invalid credentials or inactive account")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<(CookieJar, Json<AuthSession>), JsonApiError> {
    match state.auth.login(input).await {
        Ok(session) => {
            LOGINS_TOTAL.with_label_values(&["success"]).inc();
            let jar = jar.add(session_cookie(session.token.clone()));
            Ok((jar, Json(session)))
        }
        Err(e) => {
            LOGINS_TOTAL.with_label_values(&["failure"]).inc();
            Err(e.into())
        }
    }
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", security(("bearer_auth" = [])),
    responses((status = 200, description = "Current user", body = crate::openapi::UserDoc), (status = 401, description = "Unauthenticated")))]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(user.into())
}

fn is_public(method: &Method, path: &str) -> bool {
    method == Method::OPTIONS
        || matches!(path, "/health" | "/metrics" | "/auth/login" | "/auth/register" | "/auth/logout")
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
        || path.starts_with("/uploads/")
}

/// Readable without a token; a valid token still identifies the caller.
fn allows_anonymous(method: &Method, path: &str) -> bool {
    method == Method::GET && (path == "/service-types" || path.starts_with("/service-types/"))
}

/// Bearer header first, then the `auth_token` cookie.
fn request_token(headers: &HeaderMap) -> Result<Option<String>, JsonApiError> {
    if let Some(h) = headers.get(header::AUTHORIZATION) {
        let value = h.to_str().unwrap_or_default();
        return match value.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(t.trim().to_string())),
            _ => Err(JsonApiError::unauthorized("invalid Authorization format (expect Bearer)")),
        };
    }
    Ok(CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty()))
}

/// Global middleware: resolves the caller from the token and stores it as
/// [`CurrentUser`]. Missing or invalid tokens are 401 outside the public routes.
pub async fn authenticate(State(state): State<ServerState>, mut req: Request, next: Next) -> Result<Response, JsonApiError> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    if is_public(&method, &path) {
        return Ok(next.run(req).await);
    }
    let optional = allows_anonymous(&method, &path);

    let token = match request_token(req.headers()) {
        Ok(t) => t,
        Err(_) if optional => None,
        Err(e) => {
            tracing::warn!(%path, "malformed Authorization header");
            return Err(e);
        }
    };
    match token {
        Some(token) => match state.auth.authenticate(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(CurrentUser(user));
            }
            Err(ServiceError::Unauthenticated(_)) if optional => {}
            Err(e) => {
                tracing::warn!(%path, err = %e, "token rejected");
                return Err(e.into());
            }
        },
        None if optional => {}
        None => {
            tracing::warn!(%path, "missing Authorization header and auth_token cookie");
            return Err(JsonApiError::unauthorized("authentication required"));
        }
    }
    Ok(next.run(req).await)
}
