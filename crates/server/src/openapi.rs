//! OpenAPI document served at `/api-docs/openapi.json`.
//!
//! The `*Doc` structs mirror the JSON bodies for documentation only; the
//! handlers (de)serialize the service types directly.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    /// customer (default) or worker
    pub role: Option<String>,
    pub location: String,
    /// Kept for workers only
    pub specialization: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct SessionUserDoc { pub id: Uuid, pub name: String, pub email: String, pub role: String }

#[derive(ToSchema)]
pub struct SessionDoc { pub message: String, pub token: String, pub user: SessionUserDoc }

#[derive(ToSchema)]
pub struct UserDoc {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub location: String,
    pub specialization: Option<String>,
    pub image: Option<String>,
    pub ratings: Vec<i16>,
    pub average_rating: f64,
    pub is_active: bool,
    #[schema(format = DateTime)]
    pub created_at: String,
    #[schema(format = DateTime)]
    pub updated_at: String,
}

#[derive(ToSchema)]
pub struct UpdateUserDoc {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub specialization: Option<String>,
    /// Admins only
    pub is_active: Option<bool>,
}

#[derive(ToSchema)]
pub struct ImageUploadDoc {
    /// JPEG or PNG
    #[schema(format = Binary)]
    pub image: String,
}

#[derive(ToSchema)]
pub struct PartyDoc { pub id: Uuid, pub name: String, pub email: String }

#[derive(ToSchema)]
pub struct ServiceTypeRefDoc { pub id: Uuid, pub name: String }

#[derive(ToSchema)]
pub struct CreateOrderDoc {
    pub service_type: Uuid,
    pub description: String,
    pub location: String,
    #[schema(format = DateTime)]
    pub scheduled_time: String,
    /// At most 50 words
    pub notes: Option<String>,
}

#[derive(ToSchema)]
pub struct OrderDoc {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub worker_id: Option<Uuid>,
    pub service_type_id: Uuid,
    pub description: String,
    pub location: String,
    /// pending | accepted | in_progress | completed | cancelled
    pub status: String,
    #[schema(format = DateTime)]
    pub scheduled_time: String,
    pub rating: Option<i16>,
    pub notes: Option<String>,
    pub customer: Option<PartyDoc>,
    pub worker: Option<PartyDoc>,
    pub service_type: Option<ServiceTypeRefDoc>,
    #[schema(format = DateTime)]
    pub created_at: String,
    #[schema(format = DateTime)]
    pub updated_at: String,
}

#[derive(ToSchema)]
pub struct StatusDoc { pub status: String }

#[derive(ToSchema)]
pub struct RateDoc {
    /// 1..=5
    pub rating: i16,
}

#[derive(ToSchema)]
pub struct CreateServiceTypeDoc { pub name: String, pub description: String }

#[derive(ToSchema)]
pub struct UpdateServiceTypeDoc {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(ToSchema)]
pub struct ServiceTypeDoc {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    #[schema(format = DateTime)]
    pub created_at: String,
    #[schema(format = DateTime)]
    pub updated_at: String,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::users::list,
        crate::routes::users::get,
        crate::routes::users::update,
        crate::routes::users::delete,
        crate::routes::users::upload_image,
        crate::routes::orders::create,
        crate::routes::orders::list,
        crate::routes::orders::get,
        crate::routes::orders::update_status,
        crate::routes::orders::assign,
        crate::routes::orders::rate,
        crate::routes::orders::delete,
        crate::routes::service_types::create,
        crate::routes::service_types::list,
        crate::routes::service_types::get,
        crate::routes::service_types::update,
        crate::routes::service_types::delete,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            SessionUserDoc,
            SessionDoc,
            UserDoc,
            UpdateUserDoc,
            ImageUploadDoc,
            PartyDoc,
            ServiceTypeRefDoc,
            CreateOrderDoc,
            OrderDoc,
            StatusDoc,
            RateDoc,
            CreateServiceTypeDoc,
            UpdateServiceTypeDoc,
            ServiceTypeDoc,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "users"),
        (name = "orders"),
        (name = "service-types")
    )
)]
pub struct ApiDoc;
