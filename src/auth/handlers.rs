use crate::{
    auth::{jwt::generate_access_token, password::verify_password},
    config::Config,
    model::role::Role,
    models::{LoginReqDto, UserSql},
};
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    access_token: String,
    #[schema(example = "Secretario")]
    role: String,
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Access token issued", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials or inactive user"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.email.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return HttpResponse::BadRequest().json(json!({
            "message": "Email and password are required"
        }));
    }

    debug!("Fetching user from database");

    // 2️⃣ Fetch user
    let db_user = match sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, email, password, rol, state
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(user.email.trim().to_lowercase())
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().json(json!({ "message": "Invalid credentials" }));
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({ "message": "Invalid credentials" }));
    }

    if !db_user.state {
        info!(user_id = db_user.id, "Inactive user refused");
        return HttpResponse::Unauthorized().json(json!({ "message": "User is inactive" }));
    }

    let role = match Role::from_str(&db_user.rol) {
        Ok(role) => role,
        Err(_) => {
            error!(user_id = db_user.id, rol = %db_user.rol, "Stored role is unknown");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 4️⃣ Generate access token
    debug!("Generating access token");

    let access_token = match generate_access_token(
        db_user.id,
        db_user.email.clone(),
        role.id(),
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        role: role.as_ref().to_string(),
    })
}
