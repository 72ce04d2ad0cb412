use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct UserRoleResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Software Developer")]
    pub name: String,
    #[schema(example = 4)]
    pub user_count: i64,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRole {
    #[schema(example = "Software Developer")]
    pub name: String,
}
