use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::MySqlPool;
use tracing::{debug, info};

use crate::{
    auth::password::{hash_password, validate_password, verify_password},
    error::{AppError, AppResult, conflict_as},
    model::{
        user::{CreateUser, User, UserResponse},
        user_type::UserType,
    },
    utils::{
        db_utils::{Filter, FilterValue, build_update_sql, execute_update},
        pagination::{Paginated, Pagination},
    },
};

/// Columns a user may change on their own profile.
pub const PROFILE_FIELDS: &[&str] = &["first_name", "last_name", "email", "phone"];

/// Columns an admin may change on any user.
pub const ADMIN_FIELDS: &[&str] = &[
    "first_name",
    "last_name",
    "email",
    "phone",
    "department_id",
    "user_role_id",
    "user_type_id",
    "is_active",
];

const EMAIL_TAKEN: &str = "Email already registered";

const SELECT_USER: &str = r#"
    SELECT
        u.id, u.first_name, u.last_name, u.email, u.phone,
        u.department_id, d.name AS department_name,
        u.user_role_id, r.name AS user_role_name,
        u.user_type_id, u.is_active, u.last_login_at,
        u.created_at, u.updated_at
    FROM users u
    LEFT JOIN departments d ON d.id = u.department_id
    LEFT JOIN user_roles r ON r.id = u.user_role_id
"#;

const SELECT_USER_ROW: &str = r#"
    SELECT id, first_name, last_name, email, phone, password_hash,
           department_id, user_role_id, user_type_id, is_active,
           created_at, updated_at
    FROM users
"#;

#[derive(Debug, Default)]
pub struct UserFilter {
    pub department_id: Option<u64>,
    pub user_role_id: Option<u64>,
    pub user_type: Option<UserType>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

impl UserFilter {
    fn to_filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(id) = self.department_id {
            filter.and("u.department_id = ?", [FilterValue::U64(id)]);
        }
        if let Some(id) = self.user_role_id {
            filter.and("u.user_role_id = ?", [FilterValue::U64(id)]);
        }
        if let Some(t) = self.user_type {
            filter.and("u.user_type_id = ?", [FilterValue::U8(t.id())]);
        }
        if let Some(active) = self.is_active {
            filter.and("u.is_active = ?", [FilterValue::Bool(active)]);
        }
        if let Some(search) = &self.search {
            filter.search(&["u.first_name", "u.last_name", "u.email"], search);
        }
        filter
    }
}

pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    };
    if !valid {
        return Err(AppError::InvalidInput(format!("'{}' is not a valid email", email)));
    }
    Ok(email)
}

fn require_name(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}

/// Checks and normalises a JSON patch in place before it reaches SQL.
pub fn sanitize_patch(patch: &mut Map<String, Value>) -> AppResult<()> {
    for field in ["first_name", "last_name"] {
        if let Some(value) = patch.get_mut(field) {
            let text = value
                .as_str()
                .ok_or_else(|| AppError::InvalidInput(format!("{} must be a string", field)))?;
            *value = Value::String(require_name(field, text)?);
        }
    }

    if let Some(value) = patch.get_mut("email") {
        let text = value
            .as_str()
            .ok_or_else(|| AppError::InvalidInput("email must be a string".into()))?;
        *value = Value::String(normalize_email(text)?);
    }

    if let Some(value) = patch.get("user_type_id") {
        let valid = value
            .as_u64()
            .and_then(|id| u8::try_from(id).ok())
            .and_then(UserType::from_id)
            .is_some();
        if !valid {
            return Err(AppError::InvalidInput("Unknown user_type_id".into()));
        }
    }

    if let Some(value) = patch.get("is_active") {
        if !value.is_boolean() {
            return Err(AppError::InvalidInput("is_active must be a boolean".into()));
        }
    }

    Ok(())
}

pub async fn list(
    pool: &MySqlPool,
    filter: &UserFilter,
    pagination: Pagination,
) -> AppResult<Paginated<UserResponse>> {
    let filter = filter.to_filter();

    let count_sql = format!(
        "SELECT COUNT(*) FROM users u{}",
        filter.where_sql()
    );
    debug!(sql = %count_sql, args = ?filter.args(), "Counting users");
    let total = filter
        .bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql))
        .fetch_one(pool)
        .await?;

    let data_sql = format!(
        "{}{} ORDER BY u.id DESC LIMIT ? OFFSET ?",
        SELECT_USER,
        filter.where_sql()
    );
    let users = filter
        .bind_as(sqlx::query_as::<_, UserResponse>(&data_sql))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(pool)
        .await?;

    Ok(Paginated::new(users, pagination, total))
}

pub async fn get(pool: &MySqlPool, id: u64) -> AppResult<UserResponse> {
    sqlx::query_as::<_, UserResponse>(&format!("{} WHERE u.id = ?", SELECT_USER))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User".into()))
}

pub async fn get_by_email(pool: &MySqlPool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("{} WHERE email = ?", SELECT_USER_ROW))
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_row(pool: &MySqlPool, id: u64) -> AppResult<User> {
    sqlx::query_as::<_, User>(&format!("{} WHERE id = ?", SELECT_USER_ROW))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User".into()))
}

pub async fn create(pool: &MySqlPool, new: CreateUser) -> AppResult<UserResponse> {
    let first_name = require_name("first_name", &new.first_name)?;
    let last_name = require_name("last_name", &new.last_name)?;
    let email = normalize_email(&new.email)?;
    validate_password(&new.password)?;
    let password_hash = hash_password(&new.password)?;
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users
            (first_name, last_name, email, phone, password_hash,
             department_id, user_role_id, user_type_id, is_active,
             created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, TRUE, ?, ?)
        "#,
    )
    .bind(&first_name)
    .bind(&last_name)
    .bind(&email)
    .bind(new.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()))
    .bind(&password_hash)
    .bind(new.department_id)
    .bind(new.user_role_id)
    .bind(new.user_type.id())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(conflict_as(EMAIL_TAKEN))?;

    let id = result.last_insert_id();
    info!(user_id = id, email = %email, "User created");
    get(pool, id).await
}

/// Applies a JSON patch restricted to `allowed` columns.
pub async fn update(
    pool: &MySqlPool,
    id: u64,
    mut patch: Map<String, Value>,
    allowed: &[&str],
) -> AppResult<UserResponse> {
    sanitize_patch(&mut patch)?;
    let update = build_update_sql("users", &patch, allowed, "id", id)?;

    // rows_affected is 0 for an unchanged row, so existence is checked first
    get(pool, id).await?;
    execute_update(pool, update)
        .await
        .map_err(conflict_as(EMAIL_TAKEN))?;

    info!(user_id = id, fields = ?patch.keys().collect::<Vec<_>>(), "User updated");
    get(pool, id).await
}

pub async fn change_password(
    pool: &MySqlPool,
    id: u64,
    current_password: &str,
    new_password: &str,
) -> AppResult<()> {
    let user = find_row(pool, id).await?;
    if !verify_password(current_password, &user.password_hash) {
        return Err(AppError::Unauthorized("Current password is incorrect".into()));
    }
    validate_password(new_password)?;
    let password_hash = hash_password(new_password)?;

    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    // existing sessions must log in again
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    info!(user_id = id, "Password changed");
    Ok(())
}

pub async fn delete(pool: &MySqlPool, id: u64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User".into()));
    }
    info!(user_id = id, "User deleted");
    Ok(())
}

pub async fn touch_last_login(pool: &MySqlPool, id: u64) -> AppResult<()> {
    sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count(pool: &MySqlPool) -> AppResult<i64> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE is_active = TRUE")
        .fetch_one(pool)
        .await?;
    Ok(total)
}
