//! Startup reconciliation of data written by older deployments.
//!
//! Every step is a no-op on a healthy database, so `reconcile` can run on
//! each boot. The returned report counts what was changed.

use chrono::Utc;
use sqlx::MySqlPool;
use strum::IntoEnumIterator;
use tracing::{info, warn};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    model::{user::CreateUser, user_type::UserType},
    service::user as user_service,
};

/// Legacy PascalCase foreign key column some old schemas carry next to `user_id`.
const LEGACY_ATTENDANCE_COLUMN: &str = "UserId";

/// Tables with `created_at` / `updated_at` pairs.
const TIMESTAMPED_TABLES: &[&str] = &["users", "departments", "user_roles", "user_types", "attendance"];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RepairReport {
    pub legacy_columns_dropped: u64,
    pub checkouts_cleared: u64,
    pub timestamps_clamped: u64,
    pub user_types_seeded: u64,
    pub admin_created: bool,
    pub tokens_purged: u64,
}

impl RepairReport {
    pub fn changes(&self) -> u64 {
        self.legacy_columns_dropped
            + self.checkouts_cleared
            + self.timestamps_clamped
            + self.user_types_seeded
            + u64::from(self.admin_created)
            + self.tokens_purged
    }

    pub fn is_clean(&self) -> bool {
        self.changes() == 0
    }
}

/// Backtick-quotes a MySQL identifier read back from `information_schema`.
pub fn quote_identifier(name: &str) -> Option<String> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then(|| format!("`{}`", name))
}

pub async fn reconcile(pool: &MySqlPool, config: &Config) -> AppResult<RepairReport> {
    let report = RepairReport {
        legacy_columns_dropped: drop_legacy_column(pool).await?,
        checkouts_cleared: clear_zero_checkouts(pool).await?,
        timestamps_clamped: clamp_timestamps(pool).await?,
        user_types_seeded: seed_user_types(pool).await?,
        admin_created: ensure_admin(pool, config).await?,
        tokens_purged: purge_stale_tokens(pool).await?,
    };

    if report.is_clean() {
        info!("Database consistent, nothing to repair");
    } else {
        info!(?report, "Database repaired");
    }
    Ok(report)
}

async fn drop_legacy_column(pool: &MySqlPool) -> AppResult<u64> {
    let present = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM information_schema.COLUMNS
        WHERE TABLE_SCHEMA = DATABASE()
          AND TABLE_NAME = 'attendance'
          AND COLUMN_NAME = ?
        "#,
    )
    .bind(LEGACY_ATTENDANCE_COLUMN)
    .fetch_one(pool)
    .await?;

    if present == 0 {
        return Ok(0);
    }

    // a column that backs a foreign key can't be dropped before the key
    let constraints = sqlx::query_scalar::<_, String>(
        r#"
        SELECT CONSTRAINT_NAME FROM information_schema.KEY_COLUMN_USAGE
        WHERE TABLE_SCHEMA = DATABASE()
          AND TABLE_NAME = 'attendance'
          AND COLUMN_NAME = ?
          AND REFERENCED_TABLE_NAME IS NOT NULL
        "#,
    )
    .bind(LEGACY_ATTENDANCE_COLUMN)
    .fetch_all(pool)
    .await?;

    for name in constraints {
        let quoted = quote_identifier(&name)
            .ok_or_else(|| AppError::Internal(format!("unexpected constraint name {}", name)))?;
        sqlx::query(&format!("ALTER TABLE attendance DROP FOREIGN KEY {}", quoted))
            .execute(pool)
            .await?;
        warn!(constraint = %name, "Dropped legacy attendance foreign key");
    }

    sqlx::query(&format!(
        "ALTER TABLE attendance DROP COLUMN `{}`",
        LEGACY_ATTENDANCE_COLUMN
    ))
    .execute(pool)
    .await?;
    warn!(column = LEGACY_ATTENDANCE_COLUMN, "Dropped legacy attendance column");
    Ok(1)
}

/// Old clients wrote midnight instead of NULL for "not checked out yet".
async fn clear_zero_checkouts(pool: &MySqlPool) -> AppResult<u64> {
    let result =
        sqlx::query("UPDATE attendance SET check_out_time = NULL WHERE check_out_time = '00:00:00'")
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

async fn clamp_timestamps(pool: &MySqlPool) -> AppResult<u64> {
    let mut total = 0;
    for table in TIMESTAMPED_TABLES {
        let result = sqlx::query(&format!(
            "UPDATE {} SET updated_at = created_at WHERE updated_at < created_at",
            table
        ))
        .execute(pool)
        .await?;
        total += result.rows_affected();
    }
    Ok(total)
}

async fn seed_user_types(pool: &MySqlPool) -> AppResult<u64> {
    let mut inserted = 0;
    for user_type in UserType::iter() {
        let result = sqlx::query("INSERT IGNORE INTO user_types (id, name) VALUES (?, ?)")
            .bind(user_type.id())
            .bind(user_type.label())
            .execute(pool)
            .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

async fn ensure_admin(pool: &MySqlPool, config: &Config) -> AppResult<bool> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(false);
    };

    if user_service::get_by_email(pool, email).await?.is_some() {
        return Ok(false);
    }

    let admin = user_service::create(
        pool,
        CreateUser {
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            email: email.clone(),
            phone: None,
            password: password.clone(),
            department_id: None,
            user_role_id: None,
            user_type: UserType::Admin,
        },
    )
    .await?;

    info!(user_id = admin.id, email = %admin.email, "Bootstrap administrator created");
    Ok(true)
}

async fn purge_stale_tokens(pool: &MySqlPool) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE revoked = TRUE OR expires_at < ?")
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_clean() {
        assert!(RepairReport::default().is_clean());
    }

    #[test]
    fn changes_add_up() {
        let report = RepairReport {
            checkouts_cleared: 3,
            timestamps_clamped: 2,
            admin_created: true,
            ..Default::default()
        };
        assert_eq!(report.changes(), 6);
        assert!(!report.is_clean());
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_identifier("attendance_ibfk_2").as_deref(), Some("`attendance_ibfk_2`"));
    }

    #[test]
    fn suspicious_identifiers_are_refused() {
        assert_eq!(quote_identifier(""), None);
        assert_eq!(quote_identifier("fk`; DROP TABLE users"), None);
        assert_eq!(quote_identifier(&"x".repeat(65)), None);
    }

    #[test]
    fn every_user_type_has_a_label() {
        let labels: Vec<_> = UserType::iter().map(UserType::label).collect();
        assert_eq!(labels, ["User", "Admin"]);
    }
}
