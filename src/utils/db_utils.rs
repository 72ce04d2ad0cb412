use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use sqlx::MySqlPool;
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::{QueryAs, QueryScalar};

use crate::error::{AppError, AppResult};

/// SQL bindable value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Build a dynamic `UPDATE` from a JSON object.
///
/// Only keys listed in `allowed` may appear; anything else is rejected, so
/// column names never come from the client. `updated_at` is always refreshed.
pub fn build_update_sql(
    table: &str,
    payload: &Map<String, Value>,
    allowed: &[&str],
    id_column: &str,
    id_value: u64,
) -> AppResult<SqlUpdate> {
    if payload.is_empty() {
        return Err(AppError::InvalidInput("No fields provided for update".into()));
    }

    if let Some(unknown) = payload.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(AppError::InvalidInput(format!(
            "Field '{}' cannot be updated",
            unknown
        )));
    }

    let mut columns: Vec<&str> = Vec::with_capacity(payload.len() + 1);
    let mut values = Vec::with_capacity(payload.len() + 2);

    for (key, value) in payload {
        columns.push(key.as_str());
        values.push(to_sql_value(key, value)?);
    }

    columns.push("updated_at");
    values.push(SqlValue::DateTime(Utc::now().naive_utc()));

    let set_clause = columns
        .iter()
        .map(|c| format!("{} = ?", c))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

fn to_sql_value(key: &str, value: &Value) -> AppResult<SqlValue> {
    Ok(match value {
        Value::String(s) => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                SqlValue::Date(d)
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                SqlValue::DateTime(dt)
            } else {
                SqlValue::String(s.clone())
            }
        }
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                SqlValue::U64(u)
            } else if let Some(i) = n.as_i64() {
                SqlValue::I64(i)
            } else if let Some(f) = n.as_f64() {
                SqlValue::F64(f)
            } else {
                return Err(AppError::InvalidInput(format!("Invalid number for '{}'", key)));
            }
        }
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Null => SqlValue::Null,
        _ => {
            return Err(AppError::InvalidInput(format!(
                "Unsupported value type for '{}'",
                key
            )));
        }
    })
}

/// Execute the update, returning affected rows.
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

/// Typed value bound into a dynamic WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    U64(u64),
    U8(u8),
    Bool(bool),
    Str(String),
    Date(NaiveDate),
}

/// Escape character for `LIKE` patterns; the same under every `sql_mode`.
const LIKE_ESCAPE: char = '!';

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

/// Dynamic `WHERE` clause whose arguments are bound, never interpolated.
#[derive(Debug, Clone)]
pub struct Filter {
    where_sql: String,
    args: Vec<FilterValue>,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            where_sql: String::from(" WHERE 1=1"),
            args: Vec::new(),
        }
    }
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `AND <condition>`; the condition holds one `?` per argument.
    pub fn and(&mut self, condition: &str, args: impl IntoIterator<Item = FilterValue>) -> &mut Self {
        self.where_sql.push_str(" AND ");
        self.where_sql.push_str(condition);
        self.args.extend(args);
        self
    }

    /// `(a LIKE ? OR b LIKE ? ...)` over `columns` with a `%term%` pattern.
    ///
    /// `%` and `_` in `term` match literally.
    pub fn search(&mut self, columns: &[&str], term: &str) -> &mut Self {
        let term = term.trim();
        if term.is_empty() || columns.is_empty() {
            return self;
        }
        let like = format!("%{}%", escape_like(term));
        let condition = columns
            .iter()
            .map(|c| format!("{} LIKE ? ESCAPE '{}'", c, LIKE_ESCAPE))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.and(
            &format!("({})", condition),
            columns.iter().map(|_| FilterValue::Str(like.clone())),
        )
    }

    pub fn where_sql(&self) -> &str {
        &self.where_sql
    }

    pub fn args(&self) -> &[FilterValue] {
        &self.args
    }

    pub fn bind_scalar<'q, O>(
        &self,
        mut query: QueryScalar<'q, MySql, O, MySqlArguments>,
    ) -> QueryScalar<'q, MySql, O, MySqlArguments> {
        for arg in &self.args {
            query = match arg {
                FilterValue::U64(v) => query.bind(*v),
                FilterValue::U8(v) => query.bind(*v),
                FilterValue::Bool(v) => query.bind(*v),
                FilterValue::Str(v) => query.bind(v.clone()),
                FilterValue::Date(v) => query.bind(*v),
            };
        }
        query
    }

    pub fn bind_as<'q, O>(
        &self,
        mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    ) -> QueryAs<'q, MySql, O, MySqlArguments> {
        for arg in &self.args {
            query = match arg {
                FilterValue::U64(v) => query.bind(*v),
                FilterValue::U8(v) => query.bind(*v),
                FilterValue::Bool(v) => query.bind(*v),
                FilterValue::Str(v) => query.bind(v.clone()),
                FilterValue::Date(v) => query.bind(*v),
            };
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn builds_set_clause_with_updated_at() {
        let payload = object(json!({ "name": "Platform" }));
        let update = build_update_sql("departments", &payload, &["name", "description"], "id", 7)
            .unwrap();

        assert_eq!(
            update.sql,
            "UPDATE departments SET name = ?, updated_at = ? WHERE id = ?"
        );
        assert_eq!(update.values.len(), 3);
        assert_eq!(update.values[0], SqlValue::String("Platform".into()));
        assert_eq!(update.values[2], SqlValue::U64(7));
    }

    #[test]
    fn rejects_columns_outside_whitelist() {
        let payload = object(json!({ "password_hash": "x" }));
        let err = build_update_sql("users", &payload, &["first_name"], "id", 1).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn rejects_empty_payload() {
        let err = build_update_sql("users", &Map::new(), &["first_name"], "id", 1).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn converts_json_types() {
        let payload = object(json!({
            "department_id": 3,
            "phone": null,
            "is_active": false,
            "hired": "2024-01-31"
        }));
        let update = build_update_sql(
            "users",
            &payload,
            &["department_id", "phone", "is_active", "hired"],
            "id",
            1,
        )
        .unwrap();

        assert!(update.values.contains(&SqlValue::U64(3)));
        assert!(update.values.contains(&SqlValue::Null));
        assert!(update.values.contains(&SqlValue::Bool(false)));
        assert!(update.values.contains(&SqlValue::Date(
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        )));
    }

    #[test]
    fn rejects_nested_values() {
        let payload = object(json!({ "first_name": ["a"] }));
        assert!(build_update_sql("users", &payload, &["first_name"], "id", 1).is_err());
    }

    #[test]
    fn filter_collects_conditions_in_order() {
        let mut filter = Filter::new();
        filter
            .and("u.department_id = ?", [FilterValue::U64(3)])
            .and("u.is_active = ?", [FilterValue::Bool(true)]);

        assert_eq!(
            filter.where_sql(),
            " WHERE 1=1 AND u.department_id = ? AND u.is_active = ?"
        );
        assert_eq!(filter.args(), &[FilterValue::U64(3), FilterValue::Bool(true)]);
    }

    #[test]
    fn search_binds_one_pattern_per_column() {
        let mut filter = Filter::new();
        filter.search(&["first_name", "email"], " jane ");

        assert_eq!(
            filter.where_sql(),
            " WHERE 1=1 AND (first_name LIKE ? ESCAPE '!' OR email LIKE ? ESCAPE '!')"
        );
        assert_eq!(filter.args().len(), 2);
        assert_eq!(filter.args()[0], FilterValue::Str("%jane%".into()));
    }

    #[test]
    fn blank_search_adds_nothing() {
        let mut filter = Filter::new();
        filter.search(&["name"], "   ");
        assert_eq!(filter.where_sql(), " WHERE 1=1");
        assert!(filter.args().is_empty());
    }

    #[test]
    fn search_wildcards_match_literally() {
        let mut filter = Filter::new();
        filter.search(&["name"], "50%_off!");
        assert_eq!(filter.args()[0], FilterValue::Str("%50!%!_off!!%".into()));
    }
}
