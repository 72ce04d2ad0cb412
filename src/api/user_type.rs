use crate::{
    auth::auth::AuthUser,
    error::AppResult,
    service::user_type as user_type_service,
};
use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;

/// Seeded account types (1 = User, 2 = Admin)
#[utoipa::path(
    get,
    path = "/api/user-types",
    responses(
        (status = 200, description = "All user types", body = [crate::model::user_type::UserTypeRow]),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_user_types(_auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let types = user_type_service::list(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(types))
}
