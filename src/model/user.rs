use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 12,
        "name": "Ana Martínez",
        "email": "ana@empresa.com",
        "identification": "0102030405",
        "rol": "Secretario",
        "state": true,
        "created_at": "2026-01-01T08:00:00"
    })
)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    /// National id number (cédula); reports are searched by it.
    pub identification: String,
    pub rol: String,
    pub state: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
