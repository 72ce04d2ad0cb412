use crate::{
    api::SearchQuery,
    auth::auth::AuthUser,
    error::AppResult,
    model::department::{CreateDepartment, UpdateDepartment},
    service::department as department_service,
    utils::pagination::Pagination,
};
use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;

/// List departments with their user counts
#[utoipa::path(
    get,
    path = "/api/departments",
    params(SearchQuery),
    responses(
        (status = 200, description = "Paginated departments", body = crate::utils::pagination::DepartmentPage),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
pub async fn list_departments(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let pagination = Pagination::from_query(query.page, query.per_page);
    let page = department_service::list(pool.get_ref(), query.search.as_deref(), pagination).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Create a department (admin)
#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created", body = crate::model::department::DepartmentResponse),
        (status = 400, description = "Empty name", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse),
        (status = 409, description = "Department name already exists", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
pub async fn create_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateDepartment>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let department = department_service::create(pool.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(department))
}

#[utoipa::path(
    get,
    path = "/api/departments/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department", body = crate::model::department::DepartmentResponse),
        (status = 404, description = "Department not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
pub async fn get_department(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let department = department_service::get(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(department))
}

/// Update name or description (admin)
#[utoipa::path(
    put,
    path = "/api/departments/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    request_body = UpdateDepartment,
    responses(
        (status = 200, description = "Updated department", body = crate::model::department::DepartmentResponse),
        (status = 400, description = "Nothing to update", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse),
        (status = 404, description = "Department not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Department name already exists", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
pub async fn update_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateDepartment>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let department =
        department_service::update(pool.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(department))
}

/// Delete a department; its users are kept without a department (admin)
#[utoipa::path(
    delete,
    path = "/api/departments/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse),
        (status = 404, description = "Department not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
pub async fn delete_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    department_service::delete(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
