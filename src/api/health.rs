use crate::{error::AppResult, service::user as user_service};
use actix_web::{HttpResponse, get, web};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    #[schema(example = "0.1.0")]
    pub version: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DbHealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    #[schema(example = 12)]
    pub active_users: i64,
}

/// Liveness check, no database access
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "Health"
)]
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check, runs one query against the pool
#[utoipa::path(
    get,
    path = "/health/db",
    responses(
        (status = 200, description = "Database reachable", body = DbHealthResponse),
        (status = 500, description = "Database unreachable", body = crate::error::ErrorResponse)
    ),
    tag = "Health"
)]
#[get("/health/db")]
pub async fn health_db(pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let active_users = user_service::count(pool.get_ref()).await?;
    debug!(active_users, "Database health check passed");
    Ok(HttpResponse::Ok().json(DbHealthResponse {
        status: "ok",
        active_users,
    }))
}
