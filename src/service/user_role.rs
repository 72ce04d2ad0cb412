use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::MySqlPool;
use tracing::info;

use crate::{
    error::{AppError, AppResult, conflict_as},
    model::user_role::{CreateUserRole, UserRoleResponse},
    utils::{
        db_utils::{Filter, build_update_sql, execute_update},
        pagination::{Paginated, Pagination},
    },
};

const NAME_TAKEN: &str = "Role name already exists";

const SELECT_ROLE: &str = r#"
    SELECT
        r.id, r.name,
        (SELECT COUNT(*) FROM users u WHERE u.user_role_id = r.id) AS user_count,
        r.created_at, r.updated_at
    FROM user_roles r
"#;

/// Role labels are free text; only surrounding whitespace is removed.
pub fn clean_role_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Role name must not be empty".into()));
    }
    if name.chars().count() > 100 {
        return Err(AppError::InvalidInput("Role name is longer than 100 characters".into()));
    }
    Ok(name.to_string())
}

pub async fn list(
    pool: &MySqlPool,
    search: Option<&str>,
    pagination: Pagination,
) -> AppResult<Paginated<UserRoleResponse>> {
    let mut filter = Filter::new();
    if let Some(term) = search {
        filter.search(&["r.name"], term);
    }

    let count_sql = format!("SELECT COUNT(*) FROM user_roles r{}", filter.where_sql());
    let total = filter
        .bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql))
        .fetch_one(pool)
        .await?;

    let data_sql = format!(
        "{}{} ORDER BY r.name LIMIT ? OFFSET ?",
        SELECT_ROLE,
        filter.where_sql()
    );
    let roles = filter
        .bind_as(sqlx::query_as::<_, UserRoleResponse>(&data_sql))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(pool)
        .await?;

    Ok(Paginated::new(roles, pagination, total))
}

pub async fn get(pool: &MySqlPool, id: u64) -> AppResult<UserRoleResponse> {
    sqlx::query_as::<_, UserRoleResponse>(&format!("{} WHERE r.id = ?", SELECT_ROLE))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Role".into()))
}

pub async fn create(pool: &MySqlPool, new: CreateUserRole) -> AppResult<UserRoleResponse> {
    let name = clean_role_name(&new.name)?;
    let now = Utc::now();

    let result =
        sqlx::query("INSERT INTO user_roles (name, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(&name)
            .bind(now)
            .bind(now)
            .execute(pool)
            .await
            .map_err(conflict_as(NAME_TAKEN))?;

    let id = result.last_insert_id();
    info!(role_id = id, name = %name, "Role created");
    get(pool, id).await
}

pub async fn rename(pool: &MySqlPool, id: u64, new: CreateUserRole) -> AppResult<UserRoleResponse> {
    let mut patch = Map::new();
    patch.insert("name".into(), Value::String(clean_role_name(&new.name)?));
    let update = build_update_sql("user_roles", &patch, &["name"], "id", id)?;

    get(pool, id).await?;
    execute_update(pool, update)
        .await
        .map_err(conflict_as(NAME_TAKEN))?;

    info!(role_id = id, "Role renamed");
    get(pool, id).await
}

pub async fn delete(pool: &MySqlPool, id: u64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM user_roles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Role".into()));
    }
    info!(role_id = id, "Role deleted");
    Ok(())
}
