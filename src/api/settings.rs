use crate::{
    api::error::ApiError,
    auth::auth::AuthUser,
    config::Config,
    model::settings::ExpectedStart,
    utils::settings_cache,
};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct ExpectedStartBody {
    /// 24-hour `HH:MM`
    #[schema(example = "07:00")]
    pub enter: String,
}

/// Read the expected start time
#[utoipa::path(
    get,
    path = "/api/settings/expected-start",
    responses(
        (status = 200, description = "Expected start in force", body = ExpectedStartBody),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_expected_start(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let expected = settings_cache::expected_start(pool.get_ref(), config.default_expected_start)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ExpectedStartBody {
        enter: expected.to_string(),
    }))
}

/// Change the expected start time
#[utoipa::path(
    put,
    path = "/api/settings/expected-start",
    request_body = ExpectedStartBody,
    responses(
        (status = 200, description = "Expected start updated", body = ExpectedStartBody),
        (status = 400, description = "Not a 24-hour HH:MM time", body = Object, example = json!({
            "message": "Expected start must be a 24-hour HH:MM time, got \"7am\""
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn put_expected_start(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<ExpectedStartBody>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let expected: ExpectedStart = body.enter.parse().map_err(ApiError::from)?;

    settings_cache::save_expected_start(pool.get_ref(), expected)
        .await
        .map_err(ApiError::from)?;

    info!(user_id = auth.user_id, email = %auth.email, %expected, "Expected start updated");

    Ok(HttpResponse::Ok().json(ExpectedStartBody {
        enter: expected.to_string(),
    }))
}
