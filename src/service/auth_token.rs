use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::{error::AppResult, models::Claims};

#[derive(Debug, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: u64,
    pub user_id: u64,
}

pub async fn store(pool: &MySqlPool, claims: &Claims) -> AppResult<()> {
    let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0).unwrap_or_else(Utc::now);

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(claims.user_id)
    .bind(&claims.jti)
    .bind(expires_at)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

/// The stored token, if it exists and has not been revoked or expired.
pub async fn find_active(pool: &MySqlPool, jti: &str) -> AppResult<Option<RefreshTokenRecord>> {
    let record = sqlx::query_as::<_, RefreshTokenRecord>(
        r#"
        SELECT id, user_id
        FROM refresh_tokens
        WHERE jti = ? AND revoked = FALSE AND expires_at > ?
        "#,
    )
    .bind(jti)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;
    Ok(record)
}

/// Returns false when the token was already revoked (or never stored).
pub async fn revoke(pool: &MySqlPool, jti: &str) -> AppResult<bool> {
    let result = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ? AND revoked = FALSE")
        .bind(jti)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
