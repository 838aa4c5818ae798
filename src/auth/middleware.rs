use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;

/// Missing rows count as inactive.
fn account_active(state: Option<bool>) -> bool {
    state == Some(true)
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let header_value = match req.headers().get("Authorization") {
        Some(h) => h.to_str().map_err(|_| {
            actix_web::error::ErrorUnauthorized(
                json!({"error": "Invalid Authorization header encoding"}),
            )
        })?,
        None => {
            let resp =
                HttpResponse::Unauthorized().json(json!({"error": "Missing Authorization header"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let token = match header_value.strip_prefix("Bearer ") {
        Some(t) => t,
        None => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"error": "Authorization header must start with Bearer"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"error": "Invalid or expired token", "details": e}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let role = match Role::from_id(claims.role) {
        Some(role) => role,
        None => {
            let resp = HttpResponse::Unauthorized().json(json!({"error": "Invalid role"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let pool = req
        .app_data::<Data<MySqlPool>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Database pool missing"))?;

    // Deactivation takes effect on the next request, not at token expiry.
    let state = sqlx::query_scalar::<_, bool>("SELECT state FROM users WHERE id = ?")
        .bind(claims.user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = claims.user_id, "Failed to load account state");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if !account_active(state) {
        let resp = HttpResponse::Unauthorized().json(json!({"error": "Account is inactive"}));
        return Ok(req.into_response(resp.map_into_boxed_body()));
    }

    req.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        email: claims.sub,
        role,
    });

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_existing_active_accounts_pass() {
        assert!(account_active(Some(true)));
        assert!(!account_active(Some(false)));
        assert!(!account_active(None));
    }
}
