use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::{
        user::{ChangePassword, CreateUser},
        user_type::UserType,
    },
    models::MessageResponse,
    service::user::{self as user_service, ADMIN_FIELDS, PROFILE_FIELDS, UserFilter},
    utils::pagination::Pagination,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub department_id: Option<u64>,
    pub user_role_id: Option<u64>,
    /// `user` or `admin`
    #[param(value_type = Option<String>, example = "admin")]
    pub user_type: Option<UserType>,
    pub is_active: Option<bool>,
    /// Matches first name, last name or e-mail
    pub search: Option<String>,
}

fn into_patch(body: Value) -> AppResult<Map<String, Value>> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::InvalidInput("Request body must be a JSON object".into())),
    }
}

/// Columns the caller may touch on `target_id`.
pub fn editable_fields(
    auth: &AuthUser,
    target_id: u64,
    patch: &Map<String, Value>,
) -> AppResult<&'static [&'static str]> {
    if auth.is_admin() {
        return Ok(ADMIN_FIELDS);
    }
    auth.require_self_or_admin(target_id)?;

    let admin_only = patch
        .keys()
        .find(|k| ADMIN_FIELDS.contains(&k.as_str()) && !PROFILE_FIELDS.contains(&k.as_str()));
    if let Some(field) = admin_only {
        return Err(AppError::Forbidden(format!("Only an admin can change {}", field)));
    }
    Ok(PROFILE_FIELDS)
}

/// List users
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Paginated user list", body = crate::utils::pagination::UserPage),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserQuery>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let query = query.into_inner();
    let pagination = Pagination::from_query(query.page, query.per_page);
    let filter = UserFilter {
        department_id: query.department_id,
        user_role_id: query.user_role_id,
        user_type: query.user_type,
        is_active: query.is_active,
        search: query.search,
    };

    let page = user_service::list(pool.get_ref(), &filter, pagination).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = crate::model::user::UserResponse),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateUser>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let user = user_service::create(pool.get_ref(), body.into_inner()).await?;
    info!(admin_id = auth.user_id, user_id = user.id, "Admin created user");
    Ok(HttpResponse::Created().json(user))
}

/// Profile of the signed-in user
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = crate::model::user::UserResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let user = user_service::get(pool.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Change own password; all refresh tokens are revoked
#[utoipa::path(
    put,
    path = "/api/users/me/password",
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "New password too short", body = crate::error::ErrorResponse),
        (status = 401, description = "Current password is incorrect", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn change_password(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<ChangePassword>,
) -> AppResult<HttpResponse> {
    user_service::change_password(
        pool.get_ref(),
        auth.user_id,
        &body.current_password,
        &body.new_password,
    )
    .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Password changed")))
}

/// Get a user (self or admin)
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = crate::model::user::UserResponse),
        (status = 403, description = "Not your account", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    auth.require_self_or_admin(user_id)?;

    let user = user_service::get(pool.get_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Partially update a user
#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    request_body = crate::model::user::UpdateUser,
    responses(
        (status = 200, description = "Updated user", body = crate::model::user::UserResponse),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 403, description = "Field or account not editable by caller", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    let patch = into_patch(body.into_inner())?;
    let allowed = editable_fields(&auth, user_id, &patch)?;

    let user = user_service::update(pool.get_ref(), user_id, patch, allowed).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Delete a user and their attendance (admin)
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin only, and not on yourself", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let user_id = path.into_inner();
    if user_id == auth.user_id {
        warn!(user_id, "Admin tried to delete own account");
        return Err(AppError::Forbidden("You cannot delete your own account".into()));
    }

    user_service::delete(pool.get_ref(), user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(id: u64, user_type: UserType) -> AuthUser {
        AuthUser {
            user_id: id,
            email: format!("u{}@example.com", id),
            user_type,
        }
    }

    fn patch(v: Value) -> Map<String, Value> {
        into_patch(v).unwrap()
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert!(into_patch(json!([1, 2])).is_err());
        assert!(into_patch(json!("name")).is_err());
    }

    #[test]
    fn admin_gets_admin_fields() {
        let admin = user(1, UserType::Admin);
        let fields = editable_fields(&admin, 5, &patch(json!({ "is_active": false }))).unwrap();
        assert_eq!(fields, ADMIN_FIELDS);
    }

    #[test]
    fn user_may_edit_own_profile() {
        let me = user(5, UserType::User);
        let fields = editable_fields(&me, 5, &patch(json!({ "phone": "123" }))).unwrap();
        assert_eq!(fields, PROFILE_FIELDS);
    }

    #[test]
    fn user_cannot_edit_someone_else() {
        let me = user(5, UserType::User);
        let err = editable_fields(&me, 6, &patch(json!({ "phone": "123" }))).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn user_cannot_promote_themself() {
        for field in ["user_type_id", "is_active", "department_id", "user_role_id"] {
            let mut p = Map::new();
            p.insert(field.to_string(), json!(2));
            let err = editable_fields(&user(5, UserType::User), 5, &p).unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)), "{field} should be admin only");
        }
    }
}
