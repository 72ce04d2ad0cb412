use crate::{
    api::SearchQuery,
    auth::auth::AuthUser,
    error::AppResult,
    model::user_role::CreateUserRole,
    service::user_role as role_service,
    utils::pagination::Pagination,
};
use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;

/// List job roles with their user counts
#[utoipa::path(
    get,
    path = "/api/roles",
    params(SearchQuery),
    responses(
        (status = 200, description = "Paginated roles", body = crate::utils::pagination::UserRolePage),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn list_roles(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let pagination = Pagination::from_query(query.page, query.per_page);
    let page = role_service::list(pool.get_ref(), query.search.as_deref(), pagination).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/roles",
    request_body = CreateUserRole,
    responses(
        (status = 201, description = "Role created", body = crate::model::user_role::UserRoleResponse),
        (status = 400, description = "Empty or overlong name", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse),
        (status = 409, description = "Role name already exists", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn create_role(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateUserRole>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let role = role_service::create(pool.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(role))
}

#[utoipa::path(
    get,
    path = "/api/roles/{role_id}",
    params(("role_id" = u64, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role", body = crate::model::user_role::UserRoleResponse),
        (status = 404, description = "Role not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn get_role(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let role = role_service::get(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(role))
}

#[utoipa::path(
    put,
    path = "/api/roles/{role_id}",
    params(("role_id" = u64, Path, description = "Role ID")),
    request_body = CreateUserRole,
    responses(
        (status = 200, description = "Renamed role", body = crate::model::user_role::UserRoleResponse),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse),
        (status = 404, description = "Role not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Role name already exists", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn update_role(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<CreateUserRole>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let role = role_service::rename(pool.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(role))
}

/// Delete a role; its users are kept without a role (admin)
#[utoipa::path(
    delete,
    path = "/api/roles/{role_id}",
    params(("role_id" = u64, Path, description = "Role ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse),
        (status = 404, description = "Role not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn delete_role(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    role_service::delete(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
