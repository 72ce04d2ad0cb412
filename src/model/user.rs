use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::user_type::UserType;

/// Row as stored, password hash included. Never serialized to clients.
#[derive(Debug, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub department_id: Option<u64>,
    pub user_role_id: Option<u64>,
    pub user_type_id: u8,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn user_type(&self) -> UserType {
        UserType::from_id(self.user_type_id).unwrap_or_default()
    }
}

/// User joined with department and role names.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "first_name": "Jane",
    "last_name": "Doe",
    "email": "jane.doe@company.com",
    "phone": "+66812345678",
    "department_id": 1,
    "department_name": "Engineering",
    "user_role_id": 1,
    "user_role_name": "Software Developer",
    "user_type_id": 1,
    "is_active": true,
    "last_login_at": null,
    "created_at": "2024-01-01T00:00:00Z",
    "updated_at": "2024-01-01T00:00:00Z"
}))]
pub struct UserResponse {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department_id: Option<u64>,
    pub department_name: Option<String>,
    pub user_role_id: Option<u64>,
    pub user_role_name: Option<String>,
    /// 1 = user, 2 = admin
    pub user_type_id: u8,
    pub is_active: bool,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub last_login_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "jane.doe@company.com", format = "email")]
    pub email: String,
    #[schema(example = "+66812345678")]
    pub phone: Option<String>,
    #[schema(example = "changeme", format = "password")]
    pub password: String,
    #[schema(example = 1)]
    pub department_id: Option<u64>,
    #[schema(example = 1)]
    pub user_role_id: Option<u64>,
    #[serde(default)]
    pub user_type: UserType,
}

/// Partial update. Non-admins may only send the profile fields
/// (`first_name`, `last_name`, `email`, `phone`).
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[schema(format = "email")]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department_id: Option<u64>,
    pub user_role_id: Option<u64>,
    /// 1 = user, 2 = admin
    pub user_type_id: Option<u8>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePassword {
    #[schema(format = "password")]
    pub current_password: String,
    #[schema(format = "password")]
    pub new_password: String,
}
