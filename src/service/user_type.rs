use sqlx::MySqlPool;

use crate::{error::AppResult, model::user_type::UserTypeRow};

pub async fn list(pool: &MySqlPool) -> AppResult<Vec<UserTypeRow>> {
    let rows = sqlx::query_as::<_, UserTypeRow>(
        "SELECT id, name, created_at, updated_at FROM user_types ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
