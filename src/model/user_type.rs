use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum UserType {
    User = 1,
    Admin = 2,
}

impl UserType {
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Name stored in the `user_types` lookup table.
    pub fn label(self) -> &'static str {
        match self {
            UserType::User => "User",
            UserType::Admin => "Admin",
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(UserType::User),
            2 => Some(UserType::Admin),
            _ => None,
        }
    }
}

impl Default for UserType {
    fn default() -> Self {
        UserType::User
    }
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct UserTypeRow {
    #[schema(example = 2)]
    pub id: u8,
    #[schema(example = "Admin")]
    pub name: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn ids_round_trip() {
        for t in UserType::iter() {
            assert_eq!(UserType::from_id(t.id()), Some(t));
        }
        assert_eq!(UserType::from_id(0), None);
        assert_eq!(UserType::from_id(3), None);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(UserType::from_str("Admin").unwrap(), UserType::Admin);
        assert_eq!(UserType::from_str("user").unwrap(), UserType::User);
        assert!(UserType::from_str("manager").is_err());
        assert_eq!(UserType::Admin.to_string(), "admin");
    }
}
