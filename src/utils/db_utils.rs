use actix_web::error::ErrorBadRequest;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// Only keys listed in `allowed` may appear in the payload; anything else is
/// rejected before it can reach the SQL text.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: i64,
) -> Result<SqlUpdate, actix_web::Error> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ErrorBadRequest("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ErrorBadRequest("No fields provided for update"));
    }

    if let Some(unknown) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ErrorBadRequest(format!("Field '{}' cannot be updated", unknown)));
    }

    let set_clause = obj
        .keys()
        .map(|k| format!("`{}` = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);

    for value in obj.values() {
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    values.push(SqlValue::Date(d));
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                    values.push(SqlValue::DateTime(dt));
                } else {
                    values.push(SqlValue::String(s.clone()));
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => return Err(ErrorBadRequest("Unsupported JSON value type")),
        }
    }

    values.push(SqlValue::I64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER_COLUMNS: &[&str] = &["name", "email", "state"];

    #[test]
    fn builds_set_clause_for_each_field() {
        let payload = json!({ "name": "Ana", "state": false });
        let update = build_update_sql("users", &payload, USER_COLUMNS, "id", 9).unwrap();

        assert_eq!(update.sql, "UPDATE users SET `name` = ?, `state` = ? WHERE id = ?");
        assert_eq!(
            update.values,
            vec![
                SqlValue::String("Ana".into()),
                SqlValue::Bool(false),
                SqlValue::I64(9)
            ]
        );
    }

    #[test]
    fn rejects_columns_outside_allow_list() {
        let payload = json!({ "password": "x" });
        assert!(build_update_sql("users", &payload, USER_COLUMNS, "id", 1).is_err());

        let injected = json!({ "name = 'x', rol": "Administrador" });
        assert!(build_update_sql("users", &injected, USER_COLUMNS, "id", 1).is_err());
    }

    #[test]
    fn rejects_empty_and_non_object_payloads() {
        assert!(build_update_sql("users", &json!({}), USER_COLUMNS, "id", 1).is_err());
        assert!(build_update_sql("users", &json!(["name"]), USER_COLUMNS, "id", 1).is_err());
    }
}
