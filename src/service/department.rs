use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::MySqlPool;
use tracing::info;

use crate::{
    error::{AppError, AppResult, conflict_as},
    model::department::{CreateDepartment, DepartmentResponse, UpdateDepartment},
    utils::{
        db_utils::{Filter, build_update_sql, execute_update},
        pagination::{Paginated, Pagination},
    },
};

const NAME_TAKEN: &str = "Department name already exists";

const SELECT_DEPARTMENT: &str = r#"
    SELECT
        d.id, d.name, d.description,
        (SELECT COUNT(*) FROM users u WHERE u.department_id = d.id) AS user_count,
        d.created_at, d.updated_at
    FROM departments d
"#;

fn clean_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Department name must not be empty".into()));
    }
    Ok(name.to_string())
}

fn clean_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

pub async fn list(
    pool: &MySqlPool,
    search: Option<&str>,
    pagination: Pagination,
) -> AppResult<Paginated<DepartmentResponse>> {
    let mut filter = Filter::new();
    if let Some(term) = search {
        filter.search(&["d.name", "d.description"], term);
    }

    let count_sql = format!("SELECT COUNT(*) FROM departments d{}", filter.where_sql());
    let total = filter
        .bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql))
        .fetch_one(pool)
        .await?;

    let data_sql = format!(
        "{}{} ORDER BY d.name LIMIT ? OFFSET ?",
        SELECT_DEPARTMENT,
        filter.where_sql()
    );
    let departments = filter
        .bind_as(sqlx::query_as::<_, DepartmentResponse>(&data_sql))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(pool)
        .await?;

    Ok(Paginated::new(departments, pagination, total))
}

pub async fn get(pool: &MySqlPool, id: u64) -> AppResult<DepartmentResponse> {
    sqlx::query_as::<_, DepartmentResponse>(&format!("{} WHERE d.id = ?", SELECT_DEPARTMENT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Department".into()))
}

pub async fn create(pool: &MySqlPool, new: CreateDepartment) -> AppResult<DepartmentResponse> {
    let name = clean_name(&new.name)?;
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO departments (name, description, created_at, updated_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&name)
    .bind(clean_description(new.description.as_deref()))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(conflict_as(NAME_TAKEN))?;

    let id = result.last_insert_id();
    info!(department_id = id, name = %name, "Department created");
    get(pool, id).await
}

pub async fn update(
    pool: &MySqlPool,
    id: u64,
    changes: UpdateDepartment,
) -> AppResult<DepartmentResponse> {
    let mut patch = Map::new();
    if let Some(name) = &changes.name {
        patch.insert("name".into(), Value::String(clean_name(name)?));
    }
    if let Some(description) = &changes.description {
        patch.insert(
            "description".into(),
            clean_description(Some(description.as_str())).map_or(Value::Null, Value::String),
        );
    }
    let update = build_update_sql("departments", &patch, &["name", "description"], "id", id)?;

    get(pool, id).await?;
    execute_update(pool, update)
        .await
        .map_err(conflict_as(NAME_TAKEN))?;

    info!(department_id = id, "Department updated");
    get(pool, id).await
}

/// Users of a deleted department keep their account with no department.
pub async fn delete(pool: &MySqlPool, id: u64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Department".into()));
    }
    info!(department_id = id, "Department deleted");
    Ok(())
}
