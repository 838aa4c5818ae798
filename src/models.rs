use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "ana@empresa.com")]
    pub email: String,
    #[schema(example = "secret")]
    pub password: String,
}

#[derive(FromRow)]
pub struct UserSql {
    pub id: u64,
    pub email: String,
    pub password: String,
    pub rol: String,
    pub state: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,
}
